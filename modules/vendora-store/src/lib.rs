//! Notification persistence: the store contract, a Postgres implementation,
//! an in-memory implementation for tests, the TTL sweeper, and the durable
//! audit sink.

pub mod audit_pg;
pub mod postgres;
pub mod store;
pub mod sweep;

pub use audit_pg::PgAuditLog;
pub use postgres::PgNotificationStore;
pub use store::{MemoryNotificationStore, NotificationFilter, NotificationStore, Page};
pub use sweep::spawn_ttl_sweeper;
