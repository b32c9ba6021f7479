//! # Redis
//!
//! RAM database.
//!
//! Core purpose is to hold the latest accepted display so each tick can decide whether anything changed.
//!
//! ## Requirements
//!
//! - Fast lookups, one read per tick
//! - Single key, overwritten on every accepted tick
//! - Survives server restarts so the first tick after a restart does not rebroadcast an unchanged display
//!
//! ## Implementation
//!
//! - Plain string key [`LIVE_DISPLAY_KEY`] holding the JSON digit array
//! - Last write wins, no TTL
//! - Connection manager reconnects on its own, one retry with a short timeout so a dead Redis fails the tick fast
use std::time::Duration;

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use tracing::info;

use crate::error::StoreError;

pub const LIVE_DISPLAY_KEY: &str = "live_display";

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct RedisCache {
    connection_manager: ConnectionManager,
}

pub async fn init_redis(redis_url: &str) -> Result<RedisCache, StoreError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url)?;
    let connection_manager = client.get_connection_manager_with_config(config).await?;

    info!("Redis connected");

    Ok(RedisCache { connection_manager })
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut connection = self.connection_manager.clone();

        Ok(connection.get(key).await?)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut connection = self.connection_manager.clone();
        let _: () = connection.set(key, value).await?;

        Ok(())
    }
}
