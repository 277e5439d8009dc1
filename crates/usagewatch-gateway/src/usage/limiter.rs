//! Per-user rate-limit table.
//!
//! One token bucket per user/session id, held in a `DashMap` so request
//! handlers can check concurrently without a global lock. The table size is
//! the "active users" figure reported in usage snapshots; idle entries are
//! evicted by the sweeper.

use std::time::{Duration, Instant};

use dashmap::DashMap;

#[derive(Debug)]
struct TokenBucket {
    rps: u32,
    capacity: u32,
    tokens: u32,
    last_refill: Instant,
    last_seen: Instant,
}

impl TokenBucket {
    fn new(rps: u32, burst: u32, now: Instant) -> Self {
        let rps = rps.max(1);
        let capacity = burst.max(1);
        Self {
            rps,
            capacity,
            tokens: capacity,
            last_refill: now,
            last_seen: now,
        }
    }

    fn allow(&mut self, now: Instant) -> bool {
        self.refill(now);
        self.last_seen = now;

        if self.tokens == 0 {
            return false;
        }
        self.tokens -= 1;
        true
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        if elapsed < Duration::from_millis(50) {
            return;
        }

        let add = (elapsed.as_millis() as u64 * self.rps as u64 / 1000).min(self.capacity as u64) as u32;
        if add > 0 {
            self.tokens = (self.tokens + add).min(self.capacity);
            self.last_refill = now;
        }
    }
}

#[derive(Debug)]
pub struct RateLimitTable {
    rps: u32,
    burst: u32,
    idle_ttl: Duration,
    entries: DashMap<String, TokenBucket>,
}

impl RateLimitTable {
    pub fn new(rps: u32, burst: u32, idle_ttl: Duration) -> Self {
        Self {
            rps,
            burst,
            idle_ttl,
            entries: DashMap::new(),
        }
    }

    /// Consume one token for `user`. Creates the entry on first sight.
    pub fn check(&self, user: &str) -> bool {
        self.check_at(user, Instant::now())
    }

    pub fn check_at(&self, user: &str, now: Instant) -> bool {
        if let Some(mut b) = self.entries.get_mut(user) {
            return b.allow(now);
        }
        self.entries
            .entry(user.to_string())
            .or_insert_with(|| TokenBucket::new(self.rps, self.burst, now))
            .allow(now)
    }

    /// Number of tracked entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, user: &str) -> bool {
        self.entries.contains_key(user)
    }

    /// Drop entries not seen for `idle_ttl`. Returns how many were removed.
    pub fn sweep_idle(&self) -> usize {
        self.sweep_idle_at(Instant::now())
    }

    pub fn sweep_idle_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, b| now.saturating_duration_since(b.last_seen) < self.idle_ttl);
        before.saturating_sub(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_then_reject() {
        let t = RateLimitTable::new(1, 3, Duration::from_secs(60));
        let now = Instant::now();
        assert!(t.check_at("a", now));
        assert!(t.check_at("a", now));
        assert!(t.check_at("a", now));
        assert!(!t.check_at("a", now));
        // other users have their own bucket
        assert!(t.check_at("b", now));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn refills_over_time() {
        let t = RateLimitTable::new(2, 1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(t.check_at("a", now));
        assert!(!t.check_at("a", now + Duration::from_millis(100)));
        assert!(t.check_at("a", now + Duration::from_millis(600)));
    }

    #[test]
    fn rejected_checks_still_keep_entry_alive() {
        let t = RateLimitTable::new(1, 1, Duration::from_secs(10));
        let now = Instant::now();
        assert!(t.check_at("a", now));
        assert!(!t.check_at("a", now + Duration::from_millis(900)));
        assert_eq!(t.sweep_idle_at(now + Duration::from_secs(10)), 0);
        assert!(t.contains("a"));
    }

    #[test]
    fn sweep_removes_only_idle_entries() {
        let t = RateLimitTable::new(1, 5, Duration::from_secs(10));
        let now = Instant::now();
        t.check_at("old", now);
        t.check_at("fresh", now + Duration::from_secs(8));

        let removed = t.sweep_idle_at(now + Duration::from_secs(12));
        assert_eq!(removed, 1);
        assert!(!t.contains("old"));
        assert!(t.contains("fresh"));
        assert_eq!(t.len(), 1);
    }
}
