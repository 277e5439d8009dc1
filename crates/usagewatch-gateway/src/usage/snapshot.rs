//! UsageSnapshotter: read-and-project over the usage collaborators.
//!
//! The snapshotter holds read-only handles to the call counter, the
//! rate-limit table, and the batch queue. It never mutates them and adds no
//! locking of its own; each source applies whatever discipline it already
//! uses for its writers.
//!
//! Timestamps are strictly increasing per snapshotter and kept in
//! microseconds: if the wall clock has not advanced past the previous stamp
//! (same microsecond, or a clock step backwards) the new stamp is the
//! previous one plus 1 µs.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use usagewatch_core::error::{Result, UsageError};
use usagewatch_core::UsageSnapshot;

use super::{BatchQueue, CallCounter, RateLimitTable};

/// Upstream calls in the current counting window.
pub trait CallCountSource: Send + Sync {
    fn call_count(&self) -> Result<u64>;
}

/// Distinct entries in the rate-limit table.
pub trait ActiveUserSource: Send + Sync {
    fn active_users(&self) -> Result<u64>;
}

/// Queued, unprocessed batch items.
pub trait PendingBatchSource: Send + Sync {
    fn pending_batches(&self) -> Result<u64>;
}

impl CallCountSource for CallCounter {
    fn call_count(&self) -> Result<u64> {
        self.count()
    }
}

impl ActiveUserSource for RateLimitTable {
    fn active_users(&self) -> Result<u64> {
        Ok(self.len() as u64)
    }
}

impl PendingBatchSource for BatchQueue {
    fn pending_batches(&self) -> Result<u64> {
        self.len().map(|n| n as u64)
    }
}

#[derive(Default)]
pub struct UsageSnapshotter {
    calls: Option<Arc<dyn CallCountSource>>,
    users: Option<Arc<dyn ActiveUserSource>>,
    batches: Option<Arc<dyn PendingBatchSource>>,
    last_us: AtomicI64,
}

impl UsageSnapshotter {
    /// Snapshotter wired to all three sources.
    pub fn new(
        calls: Arc<dyn CallCountSource>,
        users: Arc<dyn ActiveUserSource>,
        batches: Arc<dyn PendingBatchSource>,
    ) -> Self {
        Self::default()
            .with_calls(calls)
            .with_users(users)
            .with_batches(batches)
    }

    pub fn with_calls(mut self, src: Arc<dyn CallCountSource>) -> Self {
        self.calls = Some(src);
        self
    }

    pub fn with_users(mut self, src: Arc<dyn ActiveUserSource>) -> Self {
        self.users = Some(src);
        self
    }

    pub fn with_batches(mut self, src: Arc<dyn PendingBatchSource>) -> Self {
        self.batches = Some(src);
        self
    }

    /// Take a snapshot of the current counters.
    ///
    /// Fails with `StateUnavailable` if a source was never wired or cannot
    /// be read right now; the caller decides the fallback.
    pub fn get_usage_stats(&self) -> Result<UsageSnapshot> {
        let (gemini_calls, active_users, pending_batches) = self.read_counts()?;

        Ok(UsageSnapshot {
            gemini_calls,
            active_users,
            pending_batches,
            timestamp: self.next_timestamp()?,
        })
    }

    /// `(gemini_calls, active_users, pending_batches)` without issuing a
    /// timestamp. Used by scrapes and readiness so they do not advance the
    /// snapshot clock.
    pub fn read_counts(&self) -> Result<(u64, u64, u64)> {
        let gemini_calls = self
            .calls
            .as_ref()
            .ok_or(UsageError::unavailable("call_counter"))?
            .call_count()?;
        let active_users = self
            .users
            .as_ref()
            .ok_or(UsageError::unavailable("rate_limits"))?
            .active_users()?;
        let pending_batches = self
            .batches
            .as_ref()
            .ok_or(UsageError::unavailable("batch_queue"))?
            .pending_batches()?;
        Ok((gemini_calls, active_users, pending_batches))
    }

    fn next_timestamp(&self) -> Result<DateTime<Utc>> {
        let now = Utc::now().timestamp_micros();
        let prev = match self
            .last_us
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last.saturating_add(1)))
            }) {
            Ok(p) | Err(p) => p,
        };
        let stamp = now.max(prev.saturating_add(1));

        let secs = stamp.div_euclid(1_000_000);
        let nanos = (stamp.rem_euclid(1_000_000) * 1_000) as u32;
        Utc.timestamp_opt(secs, nanos)
            .single()
            .ok_or_else(|| UsageError::Internal(format!("timestamp out of range: {stamp}")))
    }
}
