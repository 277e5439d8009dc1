//! Usage state: the collaborators that own the counters, and the
//! snapshotter that reads them.
//!
//! - `CallCounter`: upstream calls per fixed window
//! - `RateLimitTable`: per-user token buckets
//! - `BatchQueue`: pending batch items
//! - `UsageSnapshotter`: read-only projection into `UsageSnapshot`

pub mod batch;
pub mod counter;
pub mod limiter;
pub mod snapshot;

pub use batch::{BatchItem, BatchQueue};
pub use counter::CallCounter;
pub use limiter::RateLimitTable;
pub use snapshot::{ActiveUserSource, CallCountSource, PendingBatchSource, UsageSnapshotter};
