use thiserror::Error;

use crate::types::Channel;

#[derive(Error, Debug)]
pub enum NotifyError {
    /// Malformed, oversized, or unsafe content. Permanent — the caller must
    /// fix the upstream data.
    #[error("Content rejected: {reason}")]
    ValidationRejected { reason: String },

    /// Pipeline rate limit hit. Transient.
    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    Throttled { retry_after_secs: u64 },

    /// Near-duplicate content capped by the dedup guard. Transient, but
    /// audited under its own reason.
    #[error("Duplicate notification suppressed, retry after {retry_after_secs}s")]
    Suppressed { retry_after_secs: u64 },

    /// A delivery channel failed. Recovered locally — the persisted record
    /// is the system of record.
    #[error("{channel} delivery failed: {reason}")]
    ChannelDeliveryFailed { channel: Channel, reason: String },

    #[error("Identity unauthorized")]
    IdentityUnauthorized,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl NotifyError {
    /// Seconds after which a transient rejection may be retried, if any.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            NotifyError::Throttled { retry_after_secs }
            | NotifyError::Suppressed { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }
}
