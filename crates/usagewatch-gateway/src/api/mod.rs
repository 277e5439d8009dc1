//! Usage HTTP API.
//!
//! - `GET /usage`     : usage snapshot
//! - `POST /v1/calls` : queue one upstream request for a user
//! - `/healthz`, `/readyz`, `/metrics` : operational endpoints

pub mod error;
pub mod ingest;
pub mod ops;
pub mod usage;

pub use error::ApiError;
