//! usagewatch gateway library entry.
//!
//! Wires the usage collaborators (call counter, rate-limit table, batch
//! queue), the snapshotter that reads them, the background workers, and the
//! HTTP surface. Consumed by the binary (`main.rs`) and by integration tests.

pub mod api;
pub mod app_state;
pub mod config;
pub mod obs;
pub mod router;
pub mod shutdown;
pub mod usage;
pub mod workers;
