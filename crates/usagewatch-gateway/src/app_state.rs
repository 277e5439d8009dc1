//! Shared application state for the usagewatch gateway.
//!
//! Owns the three usage collaborators (call counter, rate-limit table, batch
//! queue) as explicit `Arc`s. The same handles are given to the HTTP
//! handlers that mutate them, to the workers, and, read-only, to the
//! snapshotter.

use std::sync::Arc;

use usagewatch_core::error::Result;

use crate::config::GatewayConfig;
use crate::obs::UsageMetrics;
use crate::usage::{BatchQueue, CallCounter, RateLimitTable, UsageSnapshotter};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    calls: Arc<CallCounter>,
    limits: Arc<RateLimitTable>,
    batches: Arc<BatchQueue>,
    snapshotter: Arc<UsageSnapshotter>,
    metrics: Arc<UsageMetrics>,
}

impl AppState {
    /// Build application state from a config.
    /// Returns Result so main can report a bad config instead of panicking.
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        Self::build(cfg, |calls, limits, batches| {
            UsageSnapshotter::new(calls.clone(), limits.clone(), batches.clone())
        })
    }

    /// Same as `new`, but with a caller-supplied snapshotter (for example one
    /// wired to fewer or different sources). Collaborators are still created
    /// from `cfg` and shared with handlers and workers.
    pub fn with_snapshotter(cfg: GatewayConfig, snapshotter: UsageSnapshotter) -> Result<Self> {
        Self::build(cfg, move |_, _, _| snapshotter)
    }

    fn build<F>(cfg: GatewayConfig, make_snapshotter: F) -> Result<Self>
    where
        F: FnOnce(&Arc<CallCounter>, &Arc<RateLimitTable>, &Arc<BatchQueue>) -> UsageSnapshotter,
    {
        cfg.validate()?;

        let calls = Arc::new(CallCounter::new(cfg.usage.call_window()));
        let limits = Arc::new(RateLimitTable::new(
            cfg.rate_limit.rps,
            cfg.rate_limit.burst,
            cfg.rate_limit.idle_ttl(),
        ));
        let batches = Arc::new(BatchQueue::new(cfg.batch.max_pending));

        let snapshotter = Arc::new(make_snapshotter(&calls, &limits, &batches));

        tracing::info!(
            call_window_ms = calls.window().as_millis() as u64,
            rps = cfg.rate_limit.rps,
            burst = cfg.rate_limit.burst,
            queue_capacity = batches.capacity(),
            "usage state initialised"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                calls,
                limits,
                batches,
                snapshotter,
                metrics: Arc::new(UsageMetrics::default()),
            }),
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn calls(&self) -> Arc<CallCounter> {
        Arc::clone(&self.inner.calls)
    }

    pub fn limits(&self) -> Arc<RateLimitTable> {
        Arc::clone(&self.inner.limits)
    }

    pub fn batches(&self) -> Arc<BatchQueue> {
        Arc::clone(&self.inner.batches)
    }

    pub fn snapshotter(&self) -> Arc<UsageSnapshotter> {
        Arc::clone(&self.inner.snapshotter)
    }

    pub fn metrics(&self) -> Arc<UsageMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }

    pub fn set_draining(&self) {
        self.inner.metrics.set_draining();
    }

    /// Gauge lines appended to `/metrics`: the current usage counts plus
    /// lifetime upstream calls. Counts are read without issuing a snapshot
    /// timestamp. Unreadable sources omit the gauges.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        let mut extra = vec![("usagewatch_gemini_calls_lifetime", self.inner.calls.total())];
        match self.inner.snapshotter.read_counts() {
            Ok((calls, users, batches)) => {
                extra.push(("usagewatch_gemini_calls_window", calls));
                extra.push(("usagewatch_active_users", users));
                extra.push(("usagewatch_pending_batches", batches));
            }
            Err(e) => {
                self.inner.metrics.snapshot_failures.inc(&[("trigger", "metrics")]);
                tracing::warn!(error = %e, "metrics snapshot unavailable");
            }
        }
        extra
    }
}
