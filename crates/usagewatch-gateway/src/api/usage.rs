//! `GET /usage`: current usage snapshot as JSON.

use axum::{extract::State, Json};
use usagewatch_core::UsageSnapshot;

use super::error::ApiError;
use crate::app_state::AppState;

pub async fn get_usage(State(state): State<AppState>) -> Result<Json<UsageSnapshot>, ApiError> {
    match state.snapshotter().get_usage_stats() {
        Ok(snap) => Ok(Json(snap)),
        Err(e) => {
            state.metrics().snapshot_failures.inc(&[("trigger", "http")]);
            tracing::warn!(error = %e, "usage snapshot failed");
            Err(e.into())
        }
    }
}
