//! WebSocket endpoint carrying every broadcast display.
//!
//! Clients connect to `/ws` and receive `{"event":"displayUpdate","data":[...]}` text frames. Anything the client
//! sends is ignored apart from close frames.
use std::sync::Arc;

use axum::{
    extract::{
        State as AxumState,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, trace, warn};

use crate::state::State;

pub async fn ws_handler(
    AxumState(state): AxumState<Arc<State>>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<State>) {
    let (mut sender, mut receiver) = socket.split();
    let mut updates = state.hub.subscribe();

    debug!("Client connected, {} subscribed", state.hub.subscribers());

    let forward_task = tokio::spawn(async move {
        loop {
            let text = match updates.recv().await {
                Ok(message) => message,
                Err(RecvError::Lagged(dropped)) => {
                    warn!(dropped, "WebSocket client lagged, messages dropped");

                    json!({
                        "event": "error",
                        "data": format!("{dropped} messages were dropped due to slow client"),
                    })
                    .to_string()
                }
                Err(RecvError::Closed) => break,
            };

            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Close(_) => break,
            Message::Text(_) | Message::Binary(_) => trace!("Ignoring client message"),
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    forward_task.abort();
    debug!("Client disconnected");
}
