//! Batch worker: drains the pending queue and sends batches upstream.
//!
//! Each dispatched batch is one upstream call and is recorded on the call
//! counter only when the upstream accepted it. Failed batches are dropped
//! (no persistence); the drop is logged and counted.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::watch;
use usagewatch_core::error::Result;

use crate::obs::UsageMetrics;
use crate::usage::{BatchItem, BatchQueue, CallCounter};

/// Upstream model API that accepts a batch of requests in one call.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn send_batch(&self, batch: &[BatchItem]) -> Result<()>;
}

/// Accepts every batch without network I/O; logs what would be sent.
#[derive(Debug, Default)]
pub struct DryRunUpstream;

#[async_trait]
impl UpstreamClient for DryRunUpstream {
    async fn send_batch(&self, batch: &[BatchItem]) -> Result<()> {
        let oldest_ms = batch
            .iter()
            .map(|b| b.enqueued_at.elapsed().as_millis() as u64)
            .max()
            .unwrap_or(0);
        tracing::debug!(items = batch.len(), oldest_ms, "dry-run upstream batch");
        Ok(())
    }
}

pub struct BatchWorker {
    queue: Arc<BatchQueue>,
    counter: Arc<CallCounter>,
    upstream: Arc<dyn UpstreamClient>,
    metrics: Arc<UsageMetrics>,
    max_batch_size: usize,
}

impl BatchWorker {
    pub fn new(
        queue: Arc<BatchQueue>,
        counter: Arc<CallCounter>,
        upstream: Arc<dyn UpstreamClient>,
        metrics: Arc<UsageMetrics>,
        max_batch_size: usize,
    ) -> Self {
        Self {
            queue,
            counter,
            upstream,
            metrics,
            max_batch_size: max_batch_size.max(1),
        }
    }

    /// Drain the queue batch by batch until it is empty.
    /// Returns the number of items the upstream accepted.
    pub async fn flush(&self) -> Result<usize> {
        let mut sent = 0usize;
        loop {
            let batch = self.queue.drain(self.max_batch_size)?;
            if batch.is_empty() {
                return Ok(sent);
            }

            let started = Instant::now();
            let res = self.upstream.send_batch(&batch).await;
            let elapsed = started.elapsed();

            match res {
                Ok(()) => {
                    self.counter.record(1)?;
                    sent += batch.len();
                    self.metrics.batches_dispatched.inc(&[("result", "ok")]);
                    self.metrics
                        .batch_dispatch_duration
                        .observe(&[("result", "ok")], elapsed);
                }
                Err(e) => {
                    tracing::warn!(items = batch.len(), error = %e, "upstream batch failed; items dropped");
                    self.metrics.batches_dispatched.inc(&[("result", "error")]);
                    self.metrics.batch_items_dropped.add(&[], batch.len() as u64);
                    self.metrics
                        .batch_dispatch_duration
                        .observe(&[("result", "error")], elapsed);
                }
            }
        }
    }

    pub async fn run(self, period: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = super::ticker(period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.flush().await {
                        Ok(0) => {}
                        Ok(n) => tracing::debug!(items = n, "batch flush"),
                        Err(e) => tracing::warn!(error = %e, "batch flush failed"),
                    }
                }
                _ = shutdown.changed() => break,
            }
        }

        match self.flush().await {
            Ok(n) => tracing::info!(items = n, "batch worker final flush"),
            Err(e) => tracing::warn!(error = %e, "batch worker final flush failed"),
        }
    }
}
