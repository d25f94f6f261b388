//! Ports the dispatcher drives. Concrete implementations live in
//! vendora-store and vendora-realtime; the pipeline-side impls for those
//! types are in [`crate::persist`].

use async_trait::async_trait;
use uuid::Uuid;

use vendora_common::{ChannelOutcomes, Notification};

/// Persists notification records.
///
/// Implemented by PgNotificationStore (postgres) and
/// MemoryNotificationStore (tests).
#[async_trait]
pub trait NotificationPersister: Send + Sync {
    /// Persist a freshly created notification. Returns its id.
    async fn persist(&self, notification: &Notification) -> anyhow::Result<Uuid>;

    /// Record the per-channel delivery outcomes after fan-out.
    async fn record_outcomes(&self, id: Uuid, outcomes: &ChannelOutcomes) -> anyhow::Result<()>;
}

/// What the realtime channel did with a publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Delivered,
    /// At-most-once, best-effort: nobody connected is not a failure.
    NoActiveConnection,
}

/// Push side of the realtime channel, as the dispatcher sees it.
#[async_trait]
pub trait RealtimePush: Send + Sync {
    async fn publish(&self, user_id: Uuid, notification: &Notification)
        -> anyhow::Result<PushOutcome>;
}
