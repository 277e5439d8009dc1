use std::time::Duration;

use serde::Deserialize;
use usagewatch_core::error::{Result, UsageError};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub usage: UsageSection,

    #[serde(default)]
    pub rate_limit: RateLimitSection,

    #[serde(default)]
    pub batch: BatchSection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(UsageError::UnsupportedVersion);
        }

        self.gateway.validate()?;
        self.usage.validate()?;
        self.rate_limit.validate()?;
        self.batch.validate()?;

        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
            usage: UsageSection::default(),
            rate_limit: RateLimitSection::default(),
            batch: BatchSection::default(),
        }
    }
}

fn bad(msg: &str) -> UsageError {
    UsageError::BadRequest(msg.into())
}

// --------------------
// gateway
// --------------------
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// How long workers get to finish their current tick after shutdown.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,

    /// After a stop signal, `/readyz` reports draining for this long while
    /// the listener keeps serving, so load balancers can take the instance out.
    #[serde(default = "default_drain_delay_ms")]
    pub drain_delay_ms: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            drain_delay_ms: default_drain_delay_ms(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(bad("gateway.listen must be a valid SocketAddr"));
        }
        if self.shutdown_grace_ms > 60_000 {
            return Err(bad("gateway.shutdown_grace_ms must be at most 60000"));
        }
        if self.drain_delay_ms > 60_000 {
            return Err(bad("gateway.drain_delay_ms must be at most 60000"));
        }
        Ok(())
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn drain_delay(&self) -> Duration {
        Duration::from_millis(self.drain_delay_ms)
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_shutdown_grace_ms() -> u64 {
    5000
}
fn default_drain_delay_ms() -> u64 {
    2000
}

// --------------------
// usage
// --------------------
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsageSection {
    /// Length of the upstream call counting window.
    #[serde(default = "default_call_window_ms")]
    pub call_window_ms: u64,

    /// Period of the scheduled usage report.
    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,
}

impl Default for UsageSection {
    fn default() -> Self {
        Self {
            call_window_ms: default_call_window_ms(),
            report_interval_ms: default_report_interval_ms(),
        }
    }
}

impl UsageSection {
    pub fn validate(&self) -> Result<()> {
        if !(1_000..=86_400_000).contains(&self.call_window_ms) {
            return Err(bad("usage.call_window_ms must be between 1000 and 86400000"));
        }
        if !(1_000..=86_400_000).contains(&self.report_interval_ms) {
            return Err(bad("usage.report_interval_ms must be between 1000 and 86400000"));
        }
        Ok(())
    }

    pub fn call_window(&self) -> Duration {
        Duration::from_millis(self.call_window_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }
}

fn default_call_window_ms() -> u64 {
    60_000
}
fn default_report_interval_ms() -> u64 {
    3_600_000
}

// --------------------
// rate_limit
// --------------------
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitSection {
    /// Per-user refill rate.
    #[serde(default = "default_rps")]
    pub rps: u32,

    /// Per-user bucket capacity.
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Entries untouched for this long are evicted by the sweeper.
    #[serde(default = "default_idle_ttl_ms")]
    pub idle_ttl_ms: u64,

    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            rps: default_rps(),
            burst: default_burst(),
            idle_ttl_ms: default_idle_ttl_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
        }
    }
}

impl RateLimitSection {
    pub fn validate(&self) -> Result<()> {
        if self.rps == 0 {
            return Err(bad("rate_limit.rps must be > 0"));
        }
        if self.burst == 0 {
            return Err(bad("rate_limit.burst must be > 0"));
        }
        if self.idle_ttl_ms < 1_000 {
            return Err(bad("rate_limit.idle_ttl_ms must be at least 1000"));
        }
        if !(100..=3_600_000).contains(&self.sweep_interval_ms) {
            return Err(bad("rate_limit.sweep_interval_ms must be between 100 and 3600000"));
        }
        Ok(())
    }

    pub fn idle_ttl(&self) -> Duration {
        Duration::from_millis(self.idle_ttl_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

fn default_rps() -> u32 {
    1
}
fn default_burst() -> u32 {
    10
}
fn default_idle_ttl_ms() -> u64 {
    600_000
}
fn default_sweep_interval_ms() -> u64 {
    60_000
}

// --------------------
// batch
// --------------------
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchSection {
    /// Items sent upstream in one call.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Queue capacity; pushes beyond it fail with QUEUE_FULL.
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,

    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            max_pending: default_max_pending(),
            flush_interval_ms: default_flush_interval_ms(),
        }
    }
}

impl BatchSection {
    pub fn validate(&self) -> Result<()> {
        if self.max_batch_size == 0 {
            return Err(bad("batch.max_batch_size must be > 0"));
        }
        if self.max_pending < self.max_batch_size {
            return Err(bad("batch.max_pending must be >= batch.max_batch_size"));
        }
        if !(10..=3_600_000).contains(&self.flush_interval_ms) {
            return Err(bad("batch.flush_interval_ms must be between 10 and 3600000"));
        }
        Ok(())
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

fn default_max_batch_size() -> usize {
    16
}
fn default_max_pending() -> usize {
    10_000
}
fn default_flush_interval_ms() -> u64 {
    2_000
}
