//! The notification pipeline: a fixed, ordered chain of independently
//! testable stages, each able to short-circuit with a terminal decision.
//!
//! Control flow: trigger evaluator → content filter → rate limiter →
//! dedup guard → preference resolver → dispatcher → {store, email,
//! realtime} → audit log. Only a request that survives every stage is
//! persisted and fanned out.

pub mod audit;
pub mod dispatch;
pub mod persist;
pub mod preferences;
pub mod ratelimit;
pub mod spam;
pub mod stage;
pub mod traits;
pub mod window;

pub use audit::{AuditEntry, AuditLog, AuditOperation, MemoryAuditLog, TracingAuditLog};
pub use dispatch::Dispatcher;
pub use preferences::{resolve_channels, ChannelDecision, MemoryProfiles, ProfileSource};
pub use ratelimit::RateLimiter;
pub use spam::SpamGuard;
pub use stage::{PipelineContext, Stage, StageOutcome};
pub use traits::{NotificationPersister, PushOutcome, RealtimePush};
pub use window::{MemoryWindowStore, WindowDecision, WindowStore};
