//! Postgres-backed notification store.
//!
//! Indexed columns carry what queries filter and sort on; the full record
//! lives in a JSONB payload column kept in sync on every mutation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use vendora_common::{ChannelOutcomes, Notification};

use crate::store::{NotificationFilter, NotificationStore, Page};

#[derive(Clone)]
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the store's schema migrations.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn decode(payload: serde_json::Value) -> anyhow::Result<Notification> {
    serde_json::from_value(payload).map_err(Into::into)
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn create(&self, notification: &Notification) -> anyhow::Result<Uuid> {
        let payload = serde_json::to_value(notification)?;
        let row = sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO notifications (id, recipient_id, created_at, expires_at, read, payload)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(notification.id)
        .bind(notification.recipient.user_id)
        .bind(notification.created_at)
        .bind(notification.expires_at)
        .bind(notification.read)
        .bind(&payload)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Notification>> {
        let row = sqlx::query_as::<_, (serde_json::Value,)>(
            "SELECT payload FROM notifications WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(payload,)| decode(payload)).transpose()
    }

    async fn find(
        &self,
        filter: &NotificationFilter,
        page: Page,
    ) -> anyhow::Result<Vec<Notification>> {
        let rows = sqlx::query_as::<_, (serde_json::Value,)>(
            r#"
            SELECT payload
            FROM notifications
            WHERE ($1::uuid IS NULL OR recipient_id = $1)
              AND (NOT $2 OR read = FALSE)
              AND ($3::text IS NULL OR payload->>'notification_type' = $3)
              AND ($4::text IS NULL OR payload->>'category' = $4)
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(filter.recipient_id)
        .bind(filter.unread_only)
        .bind(filter.notification_type.map(|t| t.to_string()))
        .bind(filter.category.map(|c| c.to_string()))
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|(payload,)| decode(payload)).collect()
    }

    async fn mark_read(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET read = TRUE, payload = jsonb_set(payload, '{read}', 'true'::jsonb)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_unread(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET read = FALSE, payload = jsonb_set(payload, '{read}', 'false'::jsonb)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_outcomes(&self, id: Uuid, outcomes: &ChannelOutcomes) -> anyhow::Result<()> {
        let outcomes = serde_json::to_value(outcomes)?;
        sqlx::query(
            r#"
            UPDATE notifications
            SET payload = jsonb_set(payload, '{outcomes}', $2::jsonb)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&outcomes)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_expired(&self, before: DateTime<Utc>) -> anyhow::Result<u64> {
        let result = sqlx::query(
            "DELETE FROM notifications WHERE expires_at IS NOT NULL AND expires_at <= $1",
        )
        .bind(before)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
