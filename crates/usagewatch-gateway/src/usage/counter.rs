//! Upstream call counter (fixed window).
//!
//! The counter owns its window reset: a window opens on the first `record`
//! after the previous one expired and lasts `window`. Reads never roll the
//! window; an expired window simply reads as 0 until the next `record`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use usagewatch_core::error::{Result, UsageError};

const COMPONENT: &str = "call_counter";

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u64,
}

#[derive(Debug)]
pub struct CallCounter {
    window: Duration,
    current: Mutex<Window>,
    total: AtomicU64,
}

impl CallCounter {
    pub fn new(window: Duration) -> Self {
        Self {
            window: window.max(Duration::from_millis(1)),
            current: Mutex::new(Window {
                started: Instant::now(),
                count: 0,
            }),
            total: AtomicU64::new(0),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Add `n` calls, opening a new window first if the current one elapsed.
    pub fn record(&self, n: u64) -> Result<()> {
        self.record_at(n, Instant::now())
    }

    pub fn record_at(&self, n: u64, now: Instant) -> Result<()> {
        let mut w = self
            .current
            .lock()
            .map_err(|_| UsageError::unavailable(COMPONENT))?;
        if now.saturating_duration_since(w.started) >= self.window {
            w.started = now;
            w.count = 0;
        }
        w.count = w.count.saturating_add(n);
        drop(w);

        self.total.fetch_add(n, Ordering::Relaxed);
        Ok(())
    }

    /// Calls in the current window.
    pub fn count(&self) -> Result<u64> {
        self.count_at(Instant::now())
    }

    pub fn count_at(&self, now: Instant) -> Result<u64> {
        let w = self
            .current
            .lock()
            .map_err(|_| UsageError::unavailable(COMPONENT))?;
        if now.saturating_duration_since(w.started) >= self.window {
            return Ok(0);
        }
        Ok(w.count)
    }

    /// Lifetime calls since process start.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_counter_reads_zero() {
        let c = CallCounter::new(Duration::from_secs(60));
        assert_eq!(c.count().unwrap(), 0);
        assert_eq!(c.total(), 0);
        assert_eq!(c.window(), Duration::from_secs(60));
    }

    #[test]
    fn counts_within_window() {
        let c = CallCounter::new(Duration::from_secs(60));
        let t0 = Instant::now();
        c.record_at(2, t0).unwrap();
        c.record_at(3, t0 + Duration::from_secs(10)).unwrap();
        assert_eq!(c.count_at(t0 + Duration::from_secs(20)).unwrap(), 5);
    }

    #[test]
    fn expired_window_reads_zero_without_reset() {
        let c = CallCounter::new(Duration::from_secs(60));
        let t0 = Instant::now();
        c.record_at(4, t0).unwrap();

        let later = t0 + Duration::from_secs(61);
        assert_eq!(c.count_at(later).unwrap(), 0);
        // still the old window; an earlier read inside it sees the calls
        assert_eq!(c.count_at(t0 + Duration::from_secs(1)).unwrap(), 4);
    }

    #[test]
    fn record_after_expiry_opens_new_window() {
        let c = CallCounter::new(Duration::from_secs(60));
        let t0 = Instant::now();
        c.record_at(4, t0).unwrap();
        let t1 = t0 + Duration::from_secs(90);
        c.record_at(1, t1).unwrap();

        assert_eq!(c.count_at(t1).unwrap(), 1);
        assert_eq!(c.count_at(t1 + Duration::from_secs(59)).unwrap(), 1);
        assert_eq!(c.total(), 5);
    }

    #[test]
    fn poisoned_lock_is_state_unavailable() {
        let c = std::sync::Arc::new(CallCounter::new(Duration::from_secs(60)));
        let c2 = std::sync::Arc::clone(&c);
        let _ = std::thread::spawn(move || {
            let _g = c2.current.lock().unwrap();
            panic!("poison");
        })
        .join();

        let err = c.count().expect_err("must fail");
        assert_eq!(err.client_code().as_str(), "STATE_UNAVAILABLE");
    }
}
