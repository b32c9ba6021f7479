//! # Display
//!
//! The 12-digit vector shown on every connected screen, the cached form it is
//! compared against, and the history record written for each accepted tick.
//!
//! ## Wire Form
//! - Cache text and broadcast payload are the same JSON integer array, e.g. `[3,0,9,1,4,4,7,2,0,0,5,8]`
//! - Records carry a v4 UUID as the Meilisearch primary key and a millisecond timestamp for sorting
use std::fmt;

use chrono::Utc;
use rand::{Rng, thread_rng};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{anomaly::is_anomalous, error::StoreError};

pub const DISPLAY_LEN: usize = 12;
pub const MAX_DIGIT: u8 = 9;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(transparent)]
pub struct DisplayVector([u8; DISPLAY_LEN]);

impl DisplayVector {
    /// Returns `None` when any digit is above [`MAX_DIGIT`].
    pub fn new(digits: [u8; DISPLAY_LEN]) -> Option<Self> {
        digits
            .iter()
            .all(|&digit| digit <= MAX_DIGIT)
            .then_some(Self(digits))
    }

    pub fn random() -> Self {
        Self::random_with(&mut thread_rng())
    }

    pub fn random_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut digits = [0u8; DISPLAY_LEN];
        for digit in digits.iter_mut() {
            *digit = rng.gen_range(0..=MAX_DIGIT);
        }

        let generated = Self(digits);
        debug!("Generated {generated}");

        generated
    }

    pub fn digits(&self) -> &[u8; DISPLAY_LEN] {
        &self.0
    }

    pub fn to_cache_text(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(&self.0)?)
    }
}

impl fmt::Display for DisplayVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// What the cache held for the latest display at decision time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cached {
    Absent,
    Empty,
    Present(Vec<u8>),
}

impl Cached {
    pub fn from_cache_text(text: Option<&str>) -> Result<Self, StoreError> {
        let Some(text) = text else {
            return Ok(Cached::Absent);
        };

        let digits: Vec<u8> = serde_json::from_str(text)?;
        if digits.is_empty() {
            Ok(Cached::Empty)
        } else {
            Ok(Cached::Present(digits))
        }
    }

    pub fn matches(&self, display: &DisplayVector) -> bool {
        match self {
            Cached::Present(digits) => digits.as_slice() == display.digits().as_slice(),
            Cached::Absent | Cached::Empty => false,
        }
    }

    pub fn digits(&self) -> &[u8] {
        match self {
            Cached::Present(digits) => digits,
            Cached::Absent | Cached::Empty => &[],
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DisplayRecord {
    pub id: Uuid,
    pub data: DisplayVector,
    pub timestamp: i64,
    pub anomaly: bool,
}

impl DisplayRecord {
    pub fn new(data: DisplayVector, anomaly: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            data,
            timestamp: Utc::now().timestamp_millis(),
            anomaly,
        }
    }

    pub fn classify(data: DisplayVector) -> Self {
        Self::new(data, is_anomalous(&data))
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn test_random_bounds() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..1000 {
            let display = DisplayVector::random_with(&mut rng);
            assert_eq!(display.digits().len(), DISPLAY_LEN);
            assert!(display.digits().iter().all(|&d| d <= MAX_DIGIT));
        }
    }

    #[test]
    fn test_random_covers_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = [false; 10];

        for _ in 0..200 {
            for &d in DisplayVector::random_with(&mut rng).digits() {
                seen[d as usize] = true;
            }
        }

        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_new_rejects_large_digit() {
        assert!(DisplayVector::new([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 10]).is_none());
        assert!(DisplayVector::new([9; DISPLAY_LEN]).is_some());
    }

    #[test]
    fn test_cache_text_round_trip() {
        let display = DisplayVector::new([3, 0, 9, 1, 4, 4, 7, 2, 0, 0, 5, 8]).unwrap();
        let text = display.to_cache_text().unwrap();

        assert_eq!(text, "[3,0,9,1,4,4,7,2,0,0,5,8]");

        let cached = Cached::from_cache_text(Some(&text)).unwrap();
        assert_eq!(cached.digits(), display.digits().as_slice());
        assert!(cached.matches(&display));
    }

    #[test]
    fn test_cached_tri_state() {
        assert_eq!(Cached::from_cache_text(None).unwrap(), Cached::Absent);
        assert_eq!(Cached::from_cache_text(Some("[]")).unwrap(), Cached::Empty);
        assert_eq!(
            Cached::from_cache_text(Some("[1,2]")).unwrap(),
            Cached::Present(vec![1, 2])
        );
    }

    #[test]
    fn test_cached_never_matches_without_value() {
        let zeros = DisplayVector::new([0; DISPLAY_LEN]).unwrap();

        assert!(!Cached::Absent.matches(&zeros));
        assert!(!Cached::Empty.matches(&zeros));
    }

    #[test]
    fn test_cached_is_order_sensitive() {
        let display = DisplayVector::new([1, 2, 3, 4, 5, 6, 7, 8, 9, 0, 1, 2]).unwrap();
        let swapped = Cached::Present(vec![2, 1, 3, 4, 5, 6, 7, 8, 9, 0, 1, 2]);

        assert!(!swapped.matches(&display));
    }

    #[test]
    fn test_cached_malformed() {
        assert!(matches!(
            Cached::from_cache_text(Some("{\"oops\":1}")),
            Err(StoreError::MalformedCache(_))
        ));
        assert!(Cached::from_cache_text(Some("[-1]")).is_err());
    }

    #[test]
    fn test_record_serializes_flat() {
        let display = DisplayVector::new([9, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        let record = DisplayRecord::classify(display);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["data"], serde_json::json!([9, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        assert_eq!(json["anomaly"], true);
        assert!(json["timestamp"].as_i64().unwrap() > 0);
    }
}
