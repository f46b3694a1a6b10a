//! Sync trigger and status handlers
//!
//! POST /sync, GET /sync/status

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::error::{ApiError, ApiResult};
use crate::services::SyncRunRecord;
use crate::AppState;

/// POST /sync
///
/// Runs a sync (with retries) and returns its record. 409 if a run is
/// already in progress, 502 if the run failed.
pub async fn trigger_sync(State(state): State<AppState>) -> ApiResult<Json<SyncRunRecord>> {
    let record = state
        .job
        .try_run()
        .await
        .ok_or_else(|| ApiError::Conflict("Sync already running".to_string()))?;

    if let Some(error) = record.error() {
        return Err(ApiError::SyncFailed(error.to_string()));
    }

    Ok(Json(record))
}

/// GET /sync/status
pub async fn sync_status(State(state): State<AppState>) -> ApiResult<Json<SyncRunRecord>> {
    state
        .job
        .last_run()
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No sync has run yet".to_string()))
}

/// Build sync routes
pub fn sync_routes() -> Router<AppState> {
    Router::new()
        .route("/sync", post(trigger_sync))
        .route("/sync/status", get(sync_status))
}
