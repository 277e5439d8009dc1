//! `POST /v1/calls`: admit one request through the per-user rate limiter
//! and queue it for batching.
//!
//! Order: body/shape -> rate limit -> queue capacity. A request rejected by
//! the limiter still consumes the user's entry in the table.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use usagewatch_core::error::UsageError;
use usagewatch_core::protocol::ingest::{CallAck, CallRequest};

use super::error::ApiError;
use crate::app_state::AppState;
use crate::usage::BatchItem;

fn outcome(e: &UsageError) -> &'static str {
    match e {
        UsageError::RateLimited => "rate_limited",
        UsageError::QueueFull { .. } => "queue_full",
        UsageError::BadRequest(_) => "bad_request",
        UsageError::StateUnavailable { .. } => "unavailable",
        _ => "error",
    }
}

pub async fn record_call(
    State(state): State<AppState>,
    body: Result<Json<CallRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CallAck>), ApiError> {
    let res = admit(&state, body);
    match &res {
        Ok(_) => state.metrics().calls_ingested.inc(&[("outcome", "queued")]),
        Err(e) => {
            state.metrics().calls_ingested.inc(&[("outcome", outcome(e))]);
            tracing::debug!(error = %e, "call rejected");
        }
    }
    let ack = res?;
    Ok((StatusCode::ACCEPTED, Json(ack)))
}

fn admit(
    state: &AppState,
    body: Result<Json<CallRequest>, JsonRejection>,
) -> Result<CallAck, UsageError> {
    let Json(req) = body.map_err(|e| UsageError::BadRequest(e.body_text()))?;
    req.validate()?;

    if !state.limits().check(&req.user) {
        return Err(UsageError::RateLimited);
    }

    let pending = state.batches().push(BatchItem::new(req.user, req.payload))?;
    Ok(CallAck {
        queued: true,
        pending: pending as u64,
    })
}
