//! # Meilisearch
//!
//! Document store for every display the ticker accepted.
//!
//!
//!
//! ## Schema
//! - Index for all displays
//! - Fields: id (**uuid**), data (**int list**), timestamp (**int**, milliseconds), anomaly (**bool**)
//! - `anomaly` is filterable, `timestamp` is sortable
//!
//!
//!
//! ## Writes
//! One document per accepted tick. We wait on the Meilisearch task so a tick only counts as persisted once the
//! document is indexed, otherwise a failed task would go unnoticed.
//!
//!
//!
//! ## Reads
//! Never used by the ticker. The REST layer asks for the newest record, the newest anomalous records, or clears
//! the whole index.
//!
//!
//!
//! ## Commands
//!
//! Peek at the newest documents.
//! ```sh
//! curl -H "Authorization: Bearer $(cat /run/secrets/MEILI_ADMIN_KEY)" \
//!   "http://localhost:7700/indexes/displays/search" -d '{"sort":["timestamp:desc"],"limit":5}'
//! ```
use std::sync::Arc;

use async_trait::async_trait;
use meilisearch_sdk::{client::Client, settings::Settings, task_info::TaskInfo, tasks::Task};
use tracing::info;

use crate::{display::DisplayRecord, error::StoreError};

pub const DISPLAY_INDEX: &str = "displays";
pub const DISPLAY_ID: &str = "id";
pub const DISPLAY_TIMESTAMP: &str = "timestamp";
pub const DISPLAY_ANOMALY: &str = "anomaly";

const NEWEST_FIRST: &[&str] = &["timestamp:desc"];
const ANOMALIES_ONLY: &str = "anomaly = true";

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn insert(&self, record: &DisplayRecord) -> Result<(), StoreError>;

    async fn latest(&self) -> Result<Option<DisplayRecord>, StoreError>;

    /// Newest first.
    async fn anomalies(&self, limit: usize) -> Result<Vec<DisplayRecord>, StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct MeiliHistory {
    meili_client: Arc<Client>,
}

pub async fn init_meilisearch(
    meili_url: &str,
    meili_admin_key: &str,
) -> Result<MeiliHistory, StoreError> {
    let meili_client = Arc::new(Client::new(meili_url, Some(meili_admin_key))?);

    let task = meili_client
        .index(DISPLAY_INDEX)
        .set_settings(&init_settings())
        .await?;
    wait(&meili_client, task).await?;

    info!("Meilisearch index {DISPLAY_INDEX} ready");

    Ok(MeiliHistory { meili_client })
}

#[async_trait]
impl HistoryStore for MeiliHistory {
    async fn insert(&self, record: &DisplayRecord) -> Result<(), StoreError> {
        let task = self
            .meili_client
            .index(DISPLAY_INDEX)
            .add_documents(std::slice::from_ref(record), Some(DISPLAY_ID))
            .await?;

        wait(&self.meili_client, task).await
    }

    async fn latest(&self) -> Result<Option<DisplayRecord>, StoreError> {
        let results = self
            .meili_client
            .index(DISPLAY_INDEX)
            .search()
            .with_sort(NEWEST_FIRST)
            .with_limit(1)
            .execute::<DisplayRecord>()
            .await?;

        Ok(results.hits.into_iter().next().map(|hit| hit.result))
    }

    async fn anomalies(&self, limit: usize) -> Result<Vec<DisplayRecord>, StoreError> {
        let results = self
            .meili_client
            .index(DISPLAY_INDEX)
            .search()
            .with_filter(ANOMALIES_ONLY)
            .with_sort(NEWEST_FIRST)
            .with_limit(limit)
            .execute::<DisplayRecord>()
            .await?;

        Ok(results.hits.into_iter().map(|hit| hit.result).collect())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let task = self
            .meili_client
            .index(DISPLAY_INDEX)
            .delete_all_documents()
            .await?;

        wait(&self.meili_client, task).await
    }
}

async fn wait(meili_client: &Client, task_info: TaskInfo) -> Result<(), StoreError> {
    let task = task_info
        .wait_for_completion(meili_client, None, None)
        .await?;

    #[cfg(feature = "verbose")]
    println!("Meili task result: {:?}", task);

    match task {
        Task::Failed { content } => Err(StoreError::TaskFailed(content.error.to_string())),
        _ => Ok(()),
    }
}

fn init_settings() -> Settings {
    Settings::new()
        .with_filterable_attributes([DISPLAY_ANOMALY])
        .with_sortable_attributes([DISPLAY_TIMESTAMP])
}
