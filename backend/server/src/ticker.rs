//! # Ticker
//!
//! Change-gated broadcast loop.
//!
//! ## Per Tick
//! 1. Generate a fresh display
//! 2. Read the cached display from Redis
//! 3. Same digits in the same order: stop here, nothing is written or sent
//! 4. Otherwise broadcast, overwrite the cache, classify, and append a history record, in that order
//!
//! Any failing step ends the tick. Earlier steps are not undone, so clients may have seen a display that never made
//! it into history.
//!
//! ## Overlap
//! The interval never waits for work. If a tick is still running when the next one fires, the new one is skipped,
//! so only one tick ever reads and writes the cached display at a time.
//!
//! ## Malformed Cache
//! Cached text that is not a JSON integer array (`"abc"`, `[300]`) fails every tick before anything is written, so
//! the loop stays stalled until someone deletes or overwrites `live_display` in Redis.
use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinSet,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, error, info, warn};

use crate::{
    broadcast::{DISPLAY_UPDATE, Publisher},
    database::{CacheStore, LIVE_DISPLAY_KEY},
    display::{Cached, DisplayRecord, DisplayVector},
    error::StoreError,
    history::HistoryStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Unchanged,
    Published { anomaly: bool, receivers: usize },
}

pub struct Ticker<C, H, P> {
    cache: C,
    history: H,
    publisher: P,
    period: Duration,
}

impl<C, H, P> Ticker<C, H, P>
where
    C: CacheStore + 'static,
    H: HistoryStore + 'static,
    P: Publisher + 'static,
{
    pub fn new(cache: C, history: H, publisher: P, period: Duration) -> Self {
        Self {
            cache,
            history,
            publisher,
            period,
        }
    }

    pub async fn tick(&self) -> Result<TickOutcome, StoreError> {
        self.apply(DisplayVector::random()).await
    }

    /// Runs everything after generation for an already chosen display.
    pub async fn apply(&self, display: DisplayVector) -> Result<TickOutcome, StoreError> {
        let cached_text = self.cache.get(LIVE_DISPLAY_KEY).await?;
        let cached = Cached::from_cache_text(cached_text.as_deref())?;

        if cached.matches(&display) {
            return Ok(TickOutcome::Unchanged);
        }

        let receivers = self.publisher.publish(DISPLAY_UPDATE, &display)?;

        self.cache
            .set(LIVE_DISPLAY_KEY, display.to_cache_text()?)
            .await?;

        let record = DisplayRecord::classify(display);
        self.history.insert(&record).await?;

        Ok(TickOutcome::Published {
            anomaly: record.anomaly,
            receivers,
        })
    }

    /// Drives ticks until the task is aborted, which also cancels the tick in flight.
    pub async fn run(self: Arc<Self>) {
        let mut timer = interval(self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Dropping the set aborts a tick still in flight
        let mut in_flight: JoinSet<()> = JoinSet::new();
        let mut skipped: u64 = 0;

        info!("Ticker running every {:?}", self.period);

        loop {
            timer.tick().await;

            while in_flight.try_join_next().is_some() {}

            if !in_flight.is_empty() {
                skipped += 1;
                warn!("Previous tick still running, skipping ({skipped} skipped so far)");
                continue;
            }

            let ticker = self.clone();
            in_flight.spawn(async move {
                ticker.log_tick().await;
            });
        }
    }

    async fn log_tick(&self) {
        match self.tick().await {
            Ok(TickOutcome::Unchanged) => debug!("Display unchanged"),
            Ok(TickOutcome::Published { anomaly, receivers }) => {
                debug!("Display published to {receivers} clients, anomaly: {anomaly}")
            }
            Err(e) => error!("Tick abandoned: {e}"),
        }
    }
}
