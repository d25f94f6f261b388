use async_trait::async_trait;

/// What the transport reports about one send attempt. Transport-level
/// errors are folded into `success = false`; the caller decides whether a
/// failure matters (it never invalidates the persisted notification).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    pub success: bool,
    pub error: Option<String>,
}

impl DeliveryResult {
    pub fn delivered() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Pluggable email transport.
#[async_trait]
pub trait EmailBackend: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> DeliveryResult;
}
