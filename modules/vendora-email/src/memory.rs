use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::backend::{DeliveryResult, EmailBackend};

/// A sent message captured by [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Records sends for assertions; can be flipped into a failing transport to
/// exercise channel-isolation paths.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    sent: Mutex<Vec<SentEmail>>,
    fail: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send report failure.
    pub fn fail_sends(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl EmailBackend for MemoryBackend {
    async fn send(&self, to: &str, subject: &str, body: &str) -> DeliveryResult {
        if self.fail.load(Ordering::SeqCst) {
            return DeliveryResult::failed("smtp transport unavailable");
        }
        self.sent.lock().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        DeliveryResult::delivered()
    }
}
