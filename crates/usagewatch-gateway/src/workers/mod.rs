//! Background workers owned by the gateway process.
//!
//! - `batcher`: drains the batch queue on `batch.flush_interval_ms`
//! - `sweeper`: evicts idle rate-limit entries on `rate_limit.sweep_interval_ms`
//! - `reporter`: ships a usage snapshot on `usage.report_interval_ms`
//!
//! All workers share one shutdown signal. The batcher flushes once more
//! after it fires; anything still running at the shutdown deadline is
//! aborted.

pub mod batcher;
pub mod reporter;
pub mod sweeper;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout_at, Instant, Interval, MissedTickBehavior};

use crate::app_state::AppState;
use crate::obs::UsageMetrics;

pub use batcher::{BatchWorker, DryRunUpstream, UpstreamClient};
pub use reporter::{LogSink, Reporter, UsageSink};
pub use sweeper::Sweeper;

/// Interval whose first tick is one `period` from now.
fn ticker(period: Duration) -> Interval {
    let mut t = interval_at(Instant::now() + period, period);
    t.set_missed_tick_behavior(MissedTickBehavior::Delay);
    t
}

pub struct Workers {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl Workers {
    pub fn spawn(
        state: &AppState,
        upstream: Arc<dyn UpstreamClient>,
        sink: Arc<dyn UsageSink>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let cfg = state.cfg();
        let mut handles = Vec::with_capacity(3);

        let batcher = BatchWorker::new(
            state.batches(),
            state.calls(),
            upstream,
            state.metrics(),
            cfg.batch.max_batch_size,
        );
        handles.push((
            "batcher",
            spawn_tracked(state, "batcher", batcher.run(cfg.batch.flush_interval(), shutdown_rx.clone())),
        ));

        let sweeper = Sweeper::new(state.limits(), state.metrics());
        handles.push((
            "sweeper",
            spawn_tracked(state, "sweeper", sweeper.run(cfg.rate_limit.sweep_interval(), shutdown_rx.clone())),
        ));

        let reporter = Reporter::new(state.snapshotter(), sink, state.metrics());
        handles.push((
            "reporter",
            spawn_tracked(state, "reporter", reporter.run(cfg.usage.report_interval(), shutdown_rx)),
        ));

        Self {
            shutdown_tx,
            handles,
        }
    }

    /// Signal every worker and wait until one shared deadline, `grace` from
    /// now. Workers still running at the deadline are aborted. Returns how
    /// many were aborted.
    pub async fn shutdown(self, grace: Duration) -> usize {
        let _ = self.shutdown_tx.send(true);
        let deadline = Instant::now() + grace;
        let mut aborted = 0;

        for (name, mut handle) in self.handles {
            match timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => tracing::debug!(worker = name, "worker stopped"),
                Ok(Err(e)) => tracing::warn!(worker = name, error = %e, "worker task failed"),
                Err(_) => {
                    handle.abort();
                    aborted += 1;
                    tracing::warn!(worker = name, "worker aborted at shutdown deadline");
                }
            }
        }
        aborted
    }
}

/// Keeps `workers_running{worker}` accurate even when the task is aborted.
struct RunningGuard {
    metrics: Arc<UsageMetrics>,
    name: &'static str,
}

impl RunningGuard {
    fn enter(metrics: Arc<UsageMetrics>, name: &'static str) -> Self {
        metrics.workers_running.inc(&[("worker", name)]);
        Self { metrics, name }
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.metrics.workers_running.dec(&[("worker", self.name)]);
    }
}

fn spawn_tracked<F>(state: &AppState, name: &'static str, fut: F) -> JoinHandle<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let metrics = state.metrics();
    tokio::spawn(async move {
        let _running = RunningGuard::enter(metrics, name);
        tracing::info!(worker = name, "worker started");
        fut.await;
    })
}
