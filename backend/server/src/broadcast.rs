//! # Broadcast
//!
//! In-process fan-out to every connected WebSocket client.
//!
//! Each message is serialized once and handed to a `tokio` broadcast channel, every socket task holds its own
//! receiver. Publishing never waits on clients: a client that connects after a publish simply misses it, a client
//! that falls more than the channel capacity behind is told how many messages it lost.
use serde::Serialize;
use tokio::sync::broadcast::{self, Receiver, Sender};

use crate::{display::DisplayVector, error::StoreError};

pub const DISPLAY_UPDATE: &str = "displayUpdate";

pub trait Publisher: Send + Sync {
    /// Returns how many subscribers the message was queued for.
    fn publish(&self, event: &str, display: &DisplayVector) -> Result<usize, StoreError>;
}

#[derive(Serialize, Debug)]
pub struct Event<'a> {
    pub event: &'a str,
    pub data: &'a DisplayVector,
}

#[derive(Clone)]
pub struct Hub {
    sender: Sender<String>,
}

impl Hub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));

        Self { sender }
    }

    pub fn subscribe(&self) -> Receiver<String> {
        self.sender.subscribe()
    }

    pub fn subscribers(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Publisher for Hub {
    fn publish(&self, event: &str, display: &DisplayVector) -> Result<usize, StoreError> {
        let message = serde_json::to_string(&Event {
            event,
            data: display,
        })
        .map_err(|e| StoreError::Broadcast(e.to_string()))?;

        // No subscribers is not a failure, the message just has nowhere to go
        Ok(self.sender.send(message).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DISPLAY_LEN;

    #[test]
    fn test_publish_without_subscribers() {
        let hub = Hub::new(4);
        let display = DisplayVector::new([1; DISPLAY_LEN]).unwrap();

        assert_eq!(hub.publish(DISPLAY_UPDATE, &display).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let hub = Hub::new(4);
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();
        let display = DisplayVector::new([1, 2, 3, 4, 5, 6, 7, 8, 9, 0, 1, 2]).unwrap();

        assert_eq!(hub.publish(DISPLAY_UPDATE, &display).unwrap(), 2);

        let expected = r#"{"event":"displayUpdate","data":[1,2,3,4,5,6,7,8,9,0,1,2]}"#;
        assert_eq!(first.recv().await.unwrap(), expected);
        assert_eq!(second.recv().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_message() {
        let hub = Hub::new(4);
        let _early = hub.subscribe();
        let display = DisplayVector::new([0; DISPLAY_LEN]).unwrap();

        hub.publish(DISPLAY_UPDATE, &display).unwrap();

        let mut late = hub.subscribe();
        assert!(late.try_recv().is_err());
    }

    #[test]
    fn test_subscriber_count() {
        let hub = Hub::new(4);
        assert_eq!(hub.subscribers(), 0);

        let receiver = hub.subscribe();
        assert_eq!(hub.subscribers(), 1);

        drop(receiver);
        assert_eq!(hub.subscribers(), 0);
    }
}
