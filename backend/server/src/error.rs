use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failures raised by the cache, history, and broadcast collaborators.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Cache unreachable: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("History store unreachable: {0}")]
    History(#[from] meilisearch_sdk::errors::Error),

    #[error("History task failed: {0}")]
    TaskFailed(String),

    #[error("Malformed cached value: {0}")]
    MalformedCache(#[from] serde_json::Error),

    #[error("Broadcast failed: {0}")]
    Broadcast(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Limit must be between 1 and {max}")]
    InvalidLimit { max: usize },

    #[error("No display recorded yet")]
    NotFound,

    #[error("Internal error: {0}")]
    InternalError(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::InvalidLimit { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}
