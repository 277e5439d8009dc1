//! Scheduled usage report: snapshot, then ship to a sink.
//!
//! `StateUnavailable` from the snapshotter skips the tick; it is not retried.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use usagewatch_core::error::Result;
use usagewatch_core::UsageSnapshot;

use crate::obs::UsageMetrics;
use crate::usage::UsageSnapshotter;

/// Destination for scheduled snapshots (metrics backend, log pipeline, ...).
#[async_trait]
pub trait UsageSink: Send + Sync {
    async fn ship(&self, snapshot: &UsageSnapshot) -> Result<()>;
}

/// Emits each snapshot as one structured log line.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl UsageSink for LogSink {
    async fn ship(&self, s: &UsageSnapshot) -> Result<()> {
        tracing::info!(
            gemini_calls = s.gemini_calls,
            active_users = s.active_users,
            pending_batches = s.pending_batches,
            idle = s.is_idle(),
            timestamp = %usagewatch_core::protocol::snapshot::ts_micros::format(&s.timestamp),
            "usage report"
        );
        Ok(())
    }
}

pub struct Reporter {
    snapshotter: Arc<UsageSnapshotter>,
    sink: Arc<dyn UsageSink>,
    metrics: Arc<UsageMetrics>,
}

impl Reporter {
    pub fn new(
        snapshotter: Arc<UsageSnapshotter>,
        sink: Arc<dyn UsageSink>,
        metrics: Arc<UsageMetrics>,
    ) -> Self {
        Self {
            snapshotter,
            sink,
            metrics,
        }
    }

    /// One report: take a snapshot and ship it.
    pub async fn report_once(&self) -> Result<UsageSnapshot> {
        let snap = match self.snapshotter.get_usage_stats() {
            Ok(s) => s,
            Err(e) => {
                self.metrics.snapshot_failures.inc(&[("trigger", "scheduled")]);
                return Err(e);
            }
        };
        self.sink.ship(&snap).await?;
        self.metrics.reports_shipped.inc(&[]);
        Ok(snap)
    }

    pub async fn run(self, period: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = super::ticker(period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.report_once().await {
                        tracing::warn!(error = %e, code = e.client_code().as_str(), "usage report skipped");
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
    }
}
