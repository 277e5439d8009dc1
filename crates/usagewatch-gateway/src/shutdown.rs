//! Stop sequence: signal -> draining -> pre-stop delay -> server stops.

use std::future::Future;
use std::time::Duration;

use crate::app_state::AppState;

/// Resolves when the server should stop accepting connections.
///
/// Marks the state as draining as soon as `signal` fires, then keeps the
/// listener up for `delay` so `/readyz` is observed as 503.
pub async fn drain_on<S>(state: AppState, signal: S, delay: Duration)
where
    S: Future<Output = ()>,
{
    signal.await;
    state.set_draining();
    tracing::info!(delay_ms = delay.as_millis() as u64, "draining before stop");
    tokio::time::sleep(delay).await;
}

/// Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
