use async_trait::async_trait;
use tracing::info;

use crate::backend::{DeliveryResult, EmailBackend};

/// Logs the send and reports success. The default backend when SMTP is not
/// configured (dev environments, CI).
#[derive(Debug, Default)]
pub struct NoopBackend;

#[async_trait]
impl EmailBackend for NoopBackend {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> DeliveryResult {
        info!(%to, %subject, "noop email backend: dropping message");
        DeliveryResult::delivered()
    }
}
