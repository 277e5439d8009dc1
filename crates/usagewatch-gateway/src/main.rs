//! usagewatch gateway
//!
//! - `GET /usage`: point-in-time usage snapshot
//! - `POST /v1/calls`: rate-limited ingest into the batch queue
//! - background batcher, rate-limit sweeper, scheduled usage reporter
//! - graceful shutdown: readiness flips to draining for `gateway.drain_delay_ms`
//!   while the listener stays up, then the server stops and workers flush
//!
//! Usage: `usagewatch-gateway [config.yaml]` (default `usagewatch.yaml`;
//! built-in defaults when that default file does not exist).

use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use usagewatch_core::error::Result;
use usagewatch_gateway::{
    app_state::AppState,
    config::{self, GatewayConfig},
    router, shutdown,
    workers::{DryRunUpstream, LogSink, Workers},
};

const DEFAULT_CONFIG: &str = "usagewatch.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, code = e.client_code().as_str(), "usagewatch-gateway failed");
            ExitCode::FAILURE
        }
    }
}

fn load_config() -> Result<GatewayConfig> {
    match std::env::args().nth(1) {
        Some(path) => config::load_from_file(&path),
        None if Path::new(DEFAULT_CONFIG).exists() => config::load_from_file(DEFAULT_CONFIG),
        None => {
            tracing::info!(path = DEFAULT_CONFIG, "config file not found; using defaults");
            Ok(GatewayConfig::default())
        }
    }
}

async fn run() -> Result<()> {
    let cfg = load_config()?;
    let listen: SocketAddr = cfg.gateway.listen.parse().map_err(|e| {
        usagewatch_core::UsageError::BadRequest(format!("gateway.listen: {e}"))
    })?;
    let grace = cfg.gateway.shutdown_grace();
    let drain_delay = cfg.gateway.drain_delay();

    let state = AppState::new(cfg)?;
    let workers = Workers::spawn(&state, Arc::new(DryRunUpstream), Arc::new(LogSink));
    let app = router::build_router(state.clone());

    tracing::info!(%listen, "usagewatch-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| usagewatch_core::UsageError::Internal(format!("bind {listen}: {e}")))?;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::drain_on(
            state.clone(),
            shutdown::shutdown_signal(),
            drain_delay,
        ))
        .await;

    let aborted = workers.shutdown(grace).await;
    tracing::info!(aborted_workers = aborted, "usagewatch-gateway stopped");

    served.map_err(|e| usagewatch_core::UsageError::Internal(format!("server failed: {e}")))
}
