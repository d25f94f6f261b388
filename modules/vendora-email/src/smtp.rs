use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::warn;

use crate::backend::{DeliveryResult, EmailBackend};

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

/// SMTP transport backend. The transport pools connections internally; one
/// backend instance is shared across the process.
pub struct SmtpBackend {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpBackend {
    pub fn new(config: SmtpConfig) -> anyhow::Result<Self> {
        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|e| anyhow::anyhow!("invalid EMAIL_FROM address: {e}"))?;

        let mut builder = SmtpTransport::relay(&config.host)?.port(config.port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(config.username, config.password));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl EmailBackend for SmtpBackend {
    async fn send(&self, to: &str, subject: &str, body: &str) -> DeliveryResult {
        let recipient = match to.parse::<Mailbox>() {
            Ok(mailbox) => mailbox,
            Err(e) => return DeliveryResult::failed(format!("invalid recipient address: {e}")),
        };

        let message = match Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .body(body.to_string())
        {
            Ok(message) => message,
            Err(e) => return DeliveryResult::failed(format!("failed to build message: {e}")),
        };

        // lettre's SMTP transport is blocking; keep it off the runtime
        // worker threads.
        let transport = self.transport.clone();
        match tokio::task::spawn_blocking(move || transport.send(&message)).await {
            Ok(Ok(_)) => DeliveryResult::delivered(),
            Ok(Err(e)) => {
                warn!(error = %e, "smtp send failed");
                DeliveryResult::failed(e.to_string())
            }
            Err(e) => DeliveryResult::failed(format!("smtp task panicked: {e}")),
        }
    }
}
