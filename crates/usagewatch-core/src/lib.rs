//! usagewatch core: wire-level models and error types.
//!
//! This crate defines the usage snapshot contract, the ingest request/ack
//! bodies, and the error surface shared by the gateway and its tests. It
//! carries no transport or runtime dependencies so the snapshot model can be
//! reused by sinks and tooling that never link the gateway.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `UsageError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{Result, UsageError};
pub use protocol::snapshot::UsageSnapshot;
