//! Wire contracts exposed over HTTP.
//!
//! - `snapshot`: `GET /usage` response body
//! - `ingest`: `POST /v1/calls` request and acknowledgement bodies

pub mod ingest;
pub mod snapshot;
