//! Spam/dedup guard — sliding-window cap on near-duplicate notifications.
//!
//! Keyed by (identity, content hash), never by notification type: two
//! distinct low-stock alerts for two different products must not suppress
//! each other, but the identical alert retried five times in five minutes
//! must be capped.

use std::sync::Arc;
use std::time::Duration;

use vendora_common::{Identity, NotifyError};

use crate::window::{WindowDecision, WindowStore};

pub const DEFAULT_DEDUP_MAX: usize = 5;
pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_secs(300);

pub struct SpamGuard {
    windows: Arc<dyn WindowStore>,
    max: usize,
    window: Duration,
}

impl SpamGuard {
    pub fn new(windows: Arc<dyn WindowStore>, max: usize, window: Duration) -> Self {
        Self { windows, max, window }
    }

    pub fn with_defaults(windows: Arc<dyn WindowStore>) -> Self {
        Self::new(windows, DEFAULT_DEDUP_MAX, DEFAULT_DEDUP_WINDOW)
    }

    /// Admit one delivery of `content_hash` to `identity`, or deny with the
    /// seconds until the oldest in-window delivery ages out.
    pub async fn admit(&self, identity: &Identity, content_hash: &str) -> Result<(), NotifyError> {
        let key = format!("{}:{}", identity.user_id, content_hash);
        match self.windows.check(&key, self.max, self.window).await {
            WindowDecision::Allowed => Ok(()),
            WindowDecision::Denied { retry_after } => Err(NotifyError::Suppressed {
                retry_after_secs: retry_after.as_secs().max(1),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::window::MemoryWindowStore;

    fn guard() -> SpamGuard {
        SpamGuard::with_defaults(Arc::new(MemoryWindowStore::new()))
    }

    #[tokio::test]
    async fn sixth_identical_delivery_is_denied() {
        let guard = guard();
        let id = Identity::user(Uuid::new_v4());
        for _ in 0..5 {
            assert!(guard.admit(&id, "abc123").await.is_ok());
        }
        let err = guard.admit(&id, "abc123").await.unwrap_err();
        match err {
            NotifyError::Suppressed { retry_after_secs } => {
                // Submitted back-to-back, so nearly the full window remains.
                assert!(retry_after_secs > 290 && retry_after_secs <= 300);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn different_content_is_not_suppressed() {
        let guard = guard();
        let id = Identity::user(Uuid::new_v4());
        for _ in 0..5 {
            guard.admit(&id, "hash-blue-mug").await.unwrap();
        }
        // A different product's alert for the same user sails through.
        assert!(guard.admit(&id, "hash-red-mug").await.is_ok());
    }

    #[tokio::test]
    async fn same_content_different_users_independent() {
        let guard = guard();
        let a = Identity::user(Uuid::new_v4());
        let b = Identity::user(Uuid::new_v4());
        for _ in 0..5 {
            guard.admit(&a, "abc123").await.unwrap();
        }
        assert!(guard.admit(&a, "abc123").await.is_err());
        assert!(guard.admit(&b, "abc123").await.is_ok());
    }
}
