use std::sync::Arc;

use crate::{
    broadcast::Hub,
    config::Config,
    database::{RedisCache, init_redis},
    error::StoreError,
    history::{MeiliHistory, init_meilisearch},
};

pub struct State {
    pub config: Config,
    pub cache: RedisCache,
    pub history: MeiliHistory,
    pub hub: Hub,
}

impl State {
    pub async fn new(config: Config) -> Result<Arc<Self>, StoreError> {
        let cache = init_redis(&config.redis_url).await?;
        let history = init_meilisearch(&config.meili_url, &config.meili_key).await?;
        let hub = Hub::new(config.broadcast_capacity);

        Ok(Arc::new(Self {
            config,
            cache,
            history,
            hub,
        }))
    }
}
