//! Bindings from the pipeline's ports to the concrete collaborators in
//! vendora-store and vendora-realtime. The traits live here; the types live
//! there.

use async_trait::async_trait;
use uuid::Uuid;

use vendora_common::{ChannelOutcomes, Notification};
use vendora_realtime::{PublishResult, RealtimeChannel};
use vendora_store::{NotificationStore, PgAuditLog};

use crate::audit::{AuditEntry, AuditLog};
use crate::traits::{NotificationPersister, PushOutcome, RealtimePush};

/// Every notification store is a persister for the dispatcher.
#[async_trait]
impl<S> NotificationPersister for S
where
    S: NotificationStore,
{
    async fn persist(&self, notification: &Notification) -> anyhow::Result<Uuid> {
        self.create(notification).await
    }

    async fn record_outcomes(&self, id: Uuid, outcomes: &ChannelOutcomes) -> anyhow::Result<()> {
        self.update_outcomes(id, outcomes).await
    }
}

#[async_trait]
impl RealtimePush for RealtimeChannel {
    async fn publish(
        &self,
        user_id: Uuid,
        notification: &Notification,
    ) -> anyhow::Result<PushOutcome> {
        Ok(match self.publish_notification(user_id, notification).await {
            PublishResult::Delivered => PushOutcome::Delivered,
            PublishResult::NoActiveConnection => PushOutcome::NoActiveConnection,
        })
    }
}

#[async_trait]
impl AuditLog for PgAuditLog {
    async fn record(&self, entry: &AuditEntry) -> anyhow::Result<()> {
        self.append(
            entry.at,
            entry.identity.user_id,
            &entry.identity.role.to_string(),
            &entry.operation.to_string(),
            &entry.notification_type.to_string(),
            &entry.category.to_string(),
            &entry.reason,
        )
        .await
    }
}
