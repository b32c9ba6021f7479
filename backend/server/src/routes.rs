use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State as AxumState},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    database::{CacheStore, LIVE_DISPLAY_KEY},
    display::{Cached, DisplayRecord},
    error::AppError,
    history::HistoryStore,
    state::State,
};

pub const DEFAULT_ANOMALY_LIMIT: usize = 10;
pub const MAX_ANOMALY_LIMIT: usize = 100;

#[derive(Deserialize)]
pub struct AnomalyQuery {
    limit: Option<usize>,
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn current_handler(
    AxumState(state): AxumState<Arc<State>>,
) -> Result<Json<Vec<u8>>, AppError> {
    let cached_text = state.cache.get(LIVE_DISPLAY_KEY).await?;
    let cached = Cached::from_cache_text(cached_text.as_deref())?;

    Ok(Json(cached.digits().to_vec()))
}

pub async fn latest_handler(
    AxumState(state): AxumState<Arc<State>>,
) -> Result<Json<DisplayRecord>, AppError> {
    state
        .history
        .latest()
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

pub async fn anomalies_handler(
    AxumState(state): AxumState<Arc<State>>,
    Query(query): Query<AnomalyQuery>,
) -> Result<Json<Vec<DisplayRecord>>, AppError> {
    let limit = anomaly_limit(query.limit)?;

    Ok(Json(state.history.anomalies(limit).await?))
}

pub async fn clear_handler(
    AxumState(state): AxumState<Arc<State>>,
) -> Result<StatusCode, AppError> {
    state.history.clear().await?;
    info!("Display history cleared");

    Ok(StatusCode::NO_CONTENT)
}

fn anomaly_limit(requested: Option<usize>) -> Result<usize, AppError> {
    match requested.unwrap_or(DEFAULT_ANOMALY_LIMIT) {
        0 => Err(AppError::InvalidLimit {
            max: MAX_ANOMALY_LIMIT,
        }),
        limit => Ok(limit.min(MAX_ANOMALY_LIMIT)),
    }
}
