//! Error types for roster-sync
//!
//! `SyncError` is what a reconciliation run can fail with; `ApiError` is
//! what the HTTP control surface returns.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Reconciliation failures
#[derive(Debug, Error)]
pub enum SyncError {
    /// Feed answered with a non-success HTTP status
    #[error("Feed unavailable: HTTP {0}")]
    FeedUnavailable(u16),

    /// Feed could not be reached (connect failure, timeout, broken body)
    #[error("Feed unreachable: {0}")]
    FeedUnreachable(String),

    /// Feed body is not valid JSON
    #[error("Feed malformed: {0}")]
    FeedMalformed(String),

    /// Record has no usable external identifier. Handled inside a run
    /// (record excluded); never aborts one.
    #[error("Record has no usable external identifier")]
    CorrelationMissing,

    /// Storage rejected a read or write for one team; aborts the run
    #[error("Persisting team {external_id} failed: {source}")]
    PersistenceFailed {
        external_id: i64,
        #[source]
        source: roster_common::Error,
    },

    /// Feed client could not be constructed
    #[error("Client configuration error: {0}")]
    Config(String),
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Conflict (409), e.g. sync already running
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Sync ran and failed after retries (502)
    #[error("Sync failed: {0}")]
    SyncFailed(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::SyncFailed(msg) => (StatusCode::BAD_GATEWAY, "SYNC_FAILED", msg),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
