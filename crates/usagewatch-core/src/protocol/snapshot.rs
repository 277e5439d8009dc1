//! Usage snapshot (JSON).
//!
//! A snapshot is an immutable copy of the usage counters taken at one
//! instant. On the wire it is exactly four camelCase keys:
//!
//! ```json
//! {"geminiCalls":42,"activeUsers":3,"pendingBatches":7,"timestamp":"2026-10-18T09:30:00.123456Z"}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time view of the usage counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UsageSnapshot {
    /// Upstream calls observed in the current counting window.
    pub gemini_calls: u64,
    /// Entries currently tracked by the rate limiter.
    pub active_users: u64,
    /// Queued, unprocessed batch items.
    pub pending_batches: u64,
    /// Creation time (UTC, microsecond precision).
    #[serde(with = "ts_micros")]
    pub timestamp: DateTime<Utc>,
}

impl UsageSnapshot {
    /// True when every counter is zero ("no activity").
    pub fn is_idle(&self) -> bool {
        self.gemini_calls == 0 && self.active_users == 0 && self.pending_batches == 0
    }

    /// Counters only, for comparing two snapshots regardless of when they were taken.
    pub fn counts(&self) -> (u64, u64, u64) {
        (self.gemini_calls, self.active_users, self.pending_batches)
    }
}

/// RFC 3339 / ISO-8601 with microseconds and a `Z` suffix.
/// Parsing accepts any RFC 3339 precision.
pub mod ts_micros {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
