//! Append-only audit trail. Every terminal pipeline state writes exactly
//! one entry; nothing in the pipeline reads it back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use vendora_common::{Identity, NotificationCategory, NotificationType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOperation {
    /// Persisted and fanned out; per-channel outcomes in the rationale.
    Delivered,
    /// Content filter rejection.
    Rejected,
    /// Rate limiter denial.
    Throttled,
    /// Dedup guard denial, or a globally-disabled profile.
    Suppressed,
}

impl std::fmt::Display for AuditOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditOperation::Delivered => write!(f, "delivered"),
            AuditOperation::Rejected => write!(f, "rejected"),
            AuditOperation::Throttled => write!(f, "throttled"),
            AuditOperation::Suppressed => write!(f, "suppressed"),
        }
    }
}

/// One pipeline decision, with enough context to reconstruct why it was
/// made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub at: DateTime<Utc>,
    pub identity: Identity,
    pub operation: AuditOperation,
    pub notification_type: NotificationType,
    pub category: NotificationCategory,
    pub reason: String,
}

impl AuditEntry {
    pub fn new(
        identity: Identity,
        operation: AuditOperation,
        notification_type: NotificationType,
        category: NotificationCategory,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            at: Utc::now(),
            identity,
            operation,
            notification_type,
            category,
            reason: reason.into(),
        }
    }
}

/// Pluggable audit sink.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, entry: &AuditEntry) -> anyhow::Result<()>;
}

/// Emits entries as structured log lines. The default sink when no
/// durable audit table is configured.
#[derive(Debug, Default)]
pub struct TracingAuditLog;

#[async_trait]
impl AuditLog for TracingAuditLog {
    async fn record(&self, entry: &AuditEntry) -> anyhow::Result<()> {
        info!(
            user_id = %entry.identity.user_id,
            operation = %entry.operation,
            notification_type = %entry.notification_type,
            category = %entry.category,
            reason = %entry.reason,
            "pipeline decision"
        );
        Ok(())
    }
}

/// In-memory sink for tests; shareable for assertions.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn record(&self, entry: &AuditEntry) -> anyhow::Result<()> {
        self.entries.lock().push(entry.clone());
        Ok(())
    }
}

/// Record an entry, downgrading sink failures to a warning. Audit sink
/// trouble must never fail a dispatch that already happened.
pub(crate) async fn record_or_warn(log: &dyn AuditLog, entry: &AuditEntry) {
    if let Err(e) = log.record(entry).await {
        warn!(error = %e, operation = %entry.operation, "failed to write audit entry");
    }
}
