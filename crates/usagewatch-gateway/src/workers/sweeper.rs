//! Rate-limit sweeper: evicts idle per-user buckets.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::obs::UsageMetrics;
use crate::usage::RateLimitTable;

pub struct Sweeper {
    limits: Arc<RateLimitTable>,
    metrics: Arc<UsageMetrics>,
}

impl Sweeper {
    pub fn new(limits: Arc<RateLimitTable>, metrics: Arc<UsageMetrics>) -> Self {
        Self { limits, metrics }
    }

    pub fn sweep_once(&self) -> usize {
        let removed = self.limits.sweep_idle();
        if removed > 0 {
            self.metrics.rate_limit_evictions.add(&[], removed as u64);
            tracing::debug!(removed, remaining = self.limits.len(), "rate-limit sweep");
        }
        removed
    }

    pub async fn run(self, period: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = super::ticker(period);
        loop {
            tokio::select! {
                _ = ticker.tick() => { self.sweep_once(); }
                _ = shutdown.changed() => break,
            }
        }
    }
}
