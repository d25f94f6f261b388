//! Durable audit sink — an append-only Postgres table. The pipeline only
//! ever writes; reads belong to operability tooling outside this core.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct PgAuditLog {
    pool: PgPool,
}

impl PgAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn append(
        &self,
        at: DateTime<Utc>,
        user_id: Uuid,
        role: &str,
        operation: &str,
        notification_type: &str,
        category: &str,
        reason: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notification_audit (at, user_id, role, operation, notification_type, category, reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(at)
        .bind(user_id)
        .bind(role)
        .bind(operation)
        .bind(notification_type)
        .bind(category)
        .bind(reason)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
