//! Ingest bodies for `POST /v1/calls`.

use serde::{Deserialize, Serialize};

/// One upstream request a user wants batched.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallRequest {
    /// User/session identifier; keys the rate-limit table.
    pub user: String,
    /// Opaque request payload, forwarded upstream as-is.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl CallRequest {
    pub fn validate(&self) -> crate::Result<()> {
        if self.user.trim().is_empty() {
            return Err(crate::UsageError::BadRequest("user must not be empty".into()));
        }
        Ok(())
    }
}

/// Acknowledgement returned once the request is queued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallAck {
    pub queued: bool,
    /// Queue length right after this request was appended.
    pub pending: u64,
}
