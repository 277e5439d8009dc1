//! Lightweight in-process metrics.
//!
//! Metrics are stored as atomics keyed by label sets and rendered in
//! Prometheus text format by the `/metrics` handler, alongside the gauges of
//! the current usage snapshot.

pub mod metrics;

pub use metrics::UsageMetrics;
