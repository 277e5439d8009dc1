//! Shared error type across usagewatch crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// A collaborator state source could not be read.
    StateUnavailable,
    /// Invalid input / malformed request.
    BadRequest,
    /// Rate limited.
    RateLimited,
    /// Pending batch queue is at capacity.
    QueueFull,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Upstream API call failed.
    Upstream,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::StateUnavailable => "STATE_UNAVAILABLE",
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::RateLimited => "RATE_LIMITED",
            ClientCode::QueueFull => "QUEUE_FULL",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Upstream => "UPSTREAM",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, UsageError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum UsageError {
    /// `component` names the collaborator that could not be read
    /// (`call_counter`, `rate_limits`, `batch_queue`).
    #[error("state unavailable: {component}")]
    StateUnavailable { component: &'static str },
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("rate limited")]
    RateLimited,
    #[error("queue full (capacity {capacity})")]
    QueueFull { capacity: usize },
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("upstream: {0}")]
    Upstream(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl UsageError {
    /// Shorthand for a missing/inaccessible collaborator.
    pub fn unavailable(component: &'static str) -> Self {
        UsageError::StateUnavailable { component }
    }

    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            UsageError::StateUnavailable { .. } => ClientCode::StateUnavailable,
            UsageError::BadRequest(_) => ClientCode::BadRequest,
            UsageError::RateLimited => ClientCode::RateLimited,
            UsageError::QueueFull { .. } => ClientCode::QueueFull,
            UsageError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            UsageError::Upstream(_) => ClientCode::Upstream,
            UsageError::Internal(_) => ClientCode::Internal,
        }
    }
}
