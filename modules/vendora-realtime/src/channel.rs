use uuid::Uuid;

use vendora_common::Notification;

use crate::auth::JwtService;
use crate::connection::ConnectionRegistry;
use crate::message::ServerMessage;

/// What happened to a publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishResult {
    Delivered,
    /// The recipient has no live connection. Expected, not a failure —
    /// the store record is the durable copy.
    NoActiveConnection,
}

/// Shared state of the realtime channel: the connection registry, the JWT
/// service connections authenticate against, and the inbound flood limit.
pub struct RealtimeChannel {
    registry: ConnectionRegistry,
    jwt: JwtService,
    /// Max inbound client messages per connection per minute.
    inbound_max_per_minute: usize,
}

impl RealtimeChannel {
    pub fn new(jwt: JwtService, inbound_max_per_minute: usize) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            jwt,
            inbound_max_per_minute,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    pub fn inbound_max_per_minute(&self) -> usize {
        self.inbound_max_per_minute
    }

    /// Push a notification to every live connection of `user_id`.
    /// At-most-once, best-effort.
    pub async fn publish_notification(
        &self,
        user_id: Uuid,
        notification: &Notification,
    ) -> PublishResult {
        let delivered = self
            .registry
            .send_to_user(
                user_id,
                ServerMessage::Notification {
                    notification: notification.clone(),
                },
            )
            .await;

        if delivered > 0 {
            PublishResult::Delivered
        } else {
            PublishResult::NoActiveConnection
        }
    }
}
