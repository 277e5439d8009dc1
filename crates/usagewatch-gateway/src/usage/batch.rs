//! Pending batch queue (bounded FIFO).

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Instant;

use usagewatch_core::error::{Result, UsageError};

const COMPONENT: &str = "batch_queue";

/// One request waiting to be sent upstream as part of a batch.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub user: String,
    pub payload: serde_json::Value,
    pub enqueued_at: Instant,
}

impl BatchItem {
    pub fn new(user: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            user: user.into(),
            payload,
            enqueued_at: Instant::now(),
        }
    }
}

#[derive(Debug)]
pub struct BatchQueue {
    capacity: usize,
    items: Mutex<VecDeque<BatchItem>>,
}

impl BatchQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            items: Mutex::new(VecDeque::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an item. Returns the queue length after the push.
    pub fn push(&self, item: BatchItem) -> Result<usize> {
        let mut q = self
            .items
            .lock()
            .map_err(|_| UsageError::unavailable(COMPONENT))?;
        if q.len() >= self.capacity {
            return Err(UsageError::QueueFull {
                capacity: self.capacity,
            });
        }
        q.push_back(item);
        Ok(q.len())
    }

    /// Remove up to `max` oldest items.
    pub fn drain(&self, max: usize) -> Result<Vec<BatchItem>> {
        let mut q = self
            .items
            .lock()
            .map_err(|_| UsageError::unavailable(COMPONENT))?;
        let n = max.min(q.len());
        Ok(q.drain(..n).collect())
    }

    pub fn len(&self) -> Result<usize> {
        self.items
            .lock()
            .map(|q| q.len())
            .map_err(|_| UsageError::unavailable(COMPONENT))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fifo_drain_respects_max() {
        let q = BatchQueue::new(10);
        for i in 0..5 {
            q.push(BatchItem::new(format!("u{i}"), json!(i))).unwrap();
        }

        let first = q.drain(2).unwrap();
        assert_eq!(first.iter().map(|b| b.user.as_str()).collect::<Vec<_>>(), ["u0", "u1"]);
        assert_eq!(q.len().unwrap(), 3);

        let rest = q.drain(100).unwrap();
        assert_eq!(rest.len(), 3);
        assert_eq!(rest[0].user, "u2");
        assert!(q.is_empty().unwrap());
        assert!(q.drain(4).unwrap().is_empty());
    }

    #[test]
    fn push_reports_length_and_rejects_when_full() {
        let q = BatchQueue::new(2);
        assert_eq!(q.capacity(), 2);
        assert_eq!(q.push(BatchItem::new("a", json!(null))).unwrap(), 1);
        assert_eq!(q.push(BatchItem::new("b", json!(null))).unwrap(), 2);

        let err = q.push(BatchItem::new("c", json!(null))).expect_err("must be full");
        assert_eq!(err.client_code().as_str(), "QUEUE_FULL");
        assert_eq!(q.len().unwrap(), 2);
    }
}
