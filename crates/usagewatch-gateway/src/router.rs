//! Axum router wiring.

use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    api::{self, ops},
    app_state::AppState,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/usage", get(api::usage::get_usage))
        .route("/v1/calls", post(api::ingest::record_call))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}
