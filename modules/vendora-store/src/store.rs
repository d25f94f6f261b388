use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use vendora_common::{ChannelOutcomes, Notification, NotificationCategory, NotificationType};

/// Query filter for listing notifications.
#[derive(Debug, Clone, Default)]
pub struct NotificationFilter {
    pub recipient_id: Option<Uuid>,
    pub unread_only: bool,
    pub notification_type: Option<NotificationType>,
    pub category: Option<NotificationCategory>,
}

#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

/// Notification persistence contract.
///
/// Implemented by [`crate::PgNotificationStore`] (postgres) and
/// [`MemoryNotificationStore`] (tests, single-process dev).
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create(&self, notification: &Notification) -> anyhow::Result<Uuid>;

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Notification>>;

    /// Newest first, within the recipient's own records unless the filter
    /// says otherwise (callers enforce who may ask for whom).
    async fn find(&self, filter: &NotificationFilter, page: Page)
        -> anyhow::Result<Vec<Notification>>;

    /// Returns false when the id does not exist.
    async fn mark_read(&self, id: Uuid) -> anyhow::Result<bool>;

    /// The explicit reverse of `mark_read` — the only sanctioned way back
    /// to unread.
    async fn mark_unread(&self, id: Uuid) -> anyhow::Result<bool>;

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;

    async fn update_outcomes(&self, id: Uuid, outcomes: &ChannelOutcomes) -> anyhow::Result<()>;

    /// Remove notifications whose TTL elapsed before `before`. Returns the
    /// number removed.
    async fn delete_expired(&self, before: DateTime<Utc>) -> anyhow::Result<u64>;
}

/// In-memory store. Creation order is preserved; reads return newest first.
#[derive(Debug, Default)]
pub struct MemoryNotificationStore {
    records: RwLock<Vec<Notification>>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn create(&self, notification: &Notification) -> anyhow::Result<Uuid> {
        self.records.write().push(notification.clone());
        Ok(notification.id)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Notification>> {
        Ok(self.records.read().iter().find(|n| n.id == id).cloned())
    }

    async fn find(
        &self,
        filter: &NotificationFilter,
        page: Page,
    ) -> anyhow::Result<Vec<Notification>> {
        let records = self.records.read();
        let mut matches: Vec<Notification> = records
            .iter()
            .filter(|n| {
                filter
                    .recipient_id
                    .is_none_or(|r| n.recipient.user_id == r)
                    && (!filter.unread_only || !n.read)
                    && filter
                        .notification_type
                        .is_none_or(|t| n.notification_type == t)
                    && filter.category.is_none_or(|c| n.category == c)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect())
    }

    async fn mark_read(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut records = self.records.write();
        match records.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_unread(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut records = self.records.write();
        match records.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|n| n.id != id);
        Ok(records.len() < before)
    }

    async fn update_outcomes(&self, id: Uuid, outcomes: &ChannelOutcomes) -> anyhow::Result<()> {
        let mut records = self.records.write();
        if let Some(n) = records.iter_mut().find(|n| n.id == id) {
            n.outcomes = outcomes.clone();
        }
        Ok(())
    }

    async fn delete_expired(&self, before: DateTime<Utc>) -> anyhow::Result<u64> {
        let mut records = self.records.write();
        let initial = records.len();
        records.retain(|n| n.expires_at.is_none_or(|e| e > before));
        Ok((initial - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use vendora_common::{Identity, NotificationRequest};

    fn notification(recipient: Identity, title: &str) -> Notification {
        Notification::from_request(
            NotificationRequest::builder()
                .recipient(recipient)
                .notification_type(NotificationType::General)
                .title(title)
                .message("m")
                .build(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn create_then_get() {
        let store = MemoryNotificationStore::new();
        let n = notification(Identity::user(Uuid::new_v4()), "hello");
        let id = store.create(&n).await.unwrap();
        let loaded = store.get(id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "hello");
    }

    #[tokio::test]
    async fn find_scopes_to_recipient() {
        let store = MemoryNotificationStore::new();
        let alice = Identity::user(Uuid::new_v4());
        let bob = Identity::user(Uuid::new_v4());
        store.create(&notification(alice, "a1")).await.unwrap();
        store.create(&notification(bob, "b1")).await.unwrap();

        let filter = NotificationFilter {
            recipient_id: Some(alice.user_id),
            ..Default::default()
        };
        let results = store.find(&filter, Page::default()).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "a1");
    }

    #[tokio::test]
    async fn unread_filter_hides_read_records() {
        let store = MemoryNotificationStore::new();
        let user = Identity::user(Uuid::new_v4());
        let id = store.create(&notification(user, "n1")).await.unwrap();
        store.create(&notification(user, "n2")).await.unwrap();
        store.mark_read(id).await.unwrap();

        let filter = NotificationFilter {
            recipient_id: Some(user.user_id),
            unread_only: true,
            ..Default::default()
        };
        let results = store.find(&filter, Page::default()).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "n2");
    }

    #[tokio::test]
    async fn mark_unread_reverses_mark_read() {
        let store = MemoryNotificationStore::new();
        let id = store
            .create(&notification(Identity::user(Uuid::new_v4()), "n"))
            .await
            .unwrap();
        store.mark_read(id).await.unwrap();
        assert!(store.get(id).await.unwrap().unwrap().read);
        store.mark_unread(id).await.unwrap();
        assert!(!store.get(id).await.unwrap().unwrap().read);
    }

    #[tokio::test]
    async fn mark_read_unknown_id_reports_false() {
        let store = MemoryNotificationStore::new();
        assert!(!store.mark_read(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn sweep_removes_only_expired() {
        let store = MemoryNotificationStore::new();
        let user = Identity::user(Uuid::new_v4());

        let mut expired = notification(user, "old");
        expired.expires_at = Some(Utc::now() - Duration::hours(1));
        let mut live = notification(user, "fresh");
        live.expires_at = Some(Utc::now() + Duration::hours(1));
        let eternal = notification(user, "no-ttl");

        store.create(&expired).await.unwrap();
        store.create(&live).await.unwrap();
        store.create(&eternal).await.unwrap();

        let removed = store.delete_expired(Utc::now()).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 2);
        assert!(store.get(expired.id).await.unwrap().is_none());
    }
}
