use std::collections::HashMap;

use chrono::{DateTime, NaiveTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use typed_builder::TypedBuilder;
use uuid::Uuid;

// --- Identity ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    VendorAdmin,
    SuperAdmin,
}

impl Role {
    /// Super-admins may read/delete any notification and may be exempted
    /// from rate limits by deployment configuration.
    pub fn is_super_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::VendorAdmin => write!(f, "vendor_admin"),
            Role::SuperAdmin => write!(f, "super_admin"),
        }
    }
}

/// An already-authenticated caller. The REST layer and the realtime channel
/// both resolve to this before anything reaches the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::User,
        }
    }
}

// --- Notification enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    LowStock,
    NewOrder,
    CubicVolumeAlert,
    CommissionUpdate,
    VendorStatusChange,
    SystemAlert,
    General,
}

impl NotificationType {
    /// The category a type belongs to when the producer doesn't say otherwise.
    pub fn default_category(&self) -> NotificationCategory {
        match self {
            NotificationType::LowStock | NotificationType::CubicVolumeAlert => {
                NotificationCategory::Product
            }
            NotificationType::NewOrder => NotificationCategory::Order,
            NotificationType::CommissionUpdate => NotificationCategory::Commission,
            NotificationType::VendorStatusChange => NotificationCategory::Account,
            NotificationType::SystemAlert | NotificationType::General => {
                NotificationCategory::System
            }
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::LowStock => write!(f, "low_stock"),
            NotificationType::NewOrder => write!(f, "new_order"),
            NotificationType::CubicVolumeAlert => write!(f, "cubic_volume_alert"),
            NotificationType::CommissionUpdate => write!(f, "commission_update"),
            NotificationType::VendorStatusChange => write!(f, "vendor_status_change"),
            NotificationType::SystemAlert => write!(f, "system_alert"),
            NotificationType::General => write!(f, "general"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Product,
    Order,
    System,
    Account,
    Commission,
}

impl std::fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationCategory::Product => write!(f, "product"),
            NotificationCategory::Order => write!(f, "order"),
            NotificationCategory::System => write!(f, "system"),
            NotificationCategory::Account => write!(f, "account"),
            NotificationCategory::Commission => write!(f, "commission"),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Store,
    Email,
    Realtime,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Store => write!(f, "store"),
            Channel::Email => write!(f, "email"),
            Channel::Realtime => write!(f, "realtime"),
        }
    }
}

// --- Requests and persisted notifications ---

/// What happened on one delivery channel for one notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// Channel was not eligible for this notification.
    Skipped,
    Delivered,
    /// Suppressed by quiet hours; the store record remains the durable copy.
    Deferred,
    /// Recipient had no live realtime connection. Not a failure.
    NoActiveConnection,
    Failed {
        error: String,
    },
}

/// Per-channel delivery results, recorded on the persisted notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChannelOutcomes {
    pub store: DeliveryOutcome,
    pub email: DeliveryOutcome,
    pub realtime: DeliveryOutcome,
}

impl Default for ChannelOutcomes {
    fn default() -> Self {
        Self {
            store: DeliveryOutcome::Skipped,
            email: DeliveryOutcome::Skipped,
            realtime: DeliveryOutcome::Skipped,
        }
    }
}

/// An ephemeral candidate produced by a trigger evaluator. Becomes a
/// [`Notification`] only after it survives every pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct NotificationRequest {
    pub recipient: Identity,
    pub notification_type: NotificationType,
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_override: Option<NotificationCategory>,
    #[builder(setter(into))]
    pub title: String,
    #[builder(setter(into))]
    pub message: String,
    #[builder(default)]
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    #[builder(default)]
    #[serde(default)]
    pub priority: Priority,
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl NotificationRequest {
    /// The category this request resolves preferences against.
    pub fn category(&self) -> NotificationCategory {
        self.category_override
            .unwrap_or_else(|| self.notification_type.default_category())
    }

    /// Stable dedup hash over title + message. Two distinct alerts for two
    /// different products hash differently; the identical alert retried
    /// hashes the same.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.title.as_bytes());
        hasher.update(b"\n");
        hasher.update(self.message.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// A persisted notification, owned by its recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient: Identity,
    pub notification_type: NotificationType,
    pub category: NotificationCategory,
    pub title: String,
    pub message: String,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub priority: Priority,
    pub action_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    pub outcomes: ChannelOutcomes,
}

impl Notification {
    pub fn from_request(request: NotificationRequest, now: DateTime<Utc>) -> Self {
        let category = request.category();
        Self {
            id: Uuid::new_v4(),
            recipient: request.recipient,
            notification_type: request.notification_type,
            category,
            title: request.title,
            message: request.message,
            metadata: request.metadata,
            priority: request.priority,
            action_url: request.action_url,
            expires_at: request.expires_at,
            created_at: now,
            read: false,
            outcomes: ChannelOutcomes::default(),
        }
    }

    /// Whether `identity` may read or delete this notification.
    pub fn accessible_by(&self, identity: &Identity) -> bool {
        identity.role.is_super_admin() || identity.user_id == self.recipient.user_id
    }
}

// --- Preferences ---

/// Per-channel preference block. Overrides are explicit enum-keyed maps;
/// a missing key means "no override at this level".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelPrefs {
    pub enabled: bool,
    #[serde(default)]
    pub by_type: HashMap<NotificationType, bool>,
    #[serde(default)]
    pub by_category: HashMap<NotificationCategory, bool>,
}

impl ChannelPrefs {
    pub fn enabled_for_all() -> Self {
        Self {
            enabled: true,
            by_type: HashMap::new(),
            by_category: HashMap::new(),
        }
    }
}

/// A daily delivery-suppression window in the user's local clock.
/// Overnight windows (`start > end`) wrap past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuietHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
    /// Offset from UTC in minutes. Positive east of Greenwich.
    pub utc_offset_minutes: i32,
}

/// Per-user notification preferences, merged with system defaults by the
/// preference service before they reach the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceProfile {
    /// Master switch. Off means no channel delivers, store included.
    pub enabled: bool,
    pub email: ChannelPrefs,
    pub realtime: ChannelPrefs,
    #[serde(default)]
    pub quiet_hours: Option<QuietHours>,
    /// Digest batching flag, passed through to the digest worker. The
    /// pipeline itself does not expand digests.
    #[serde(default)]
    pub digest: bool,
}

impl Default for PreferenceProfile {
    fn default() -> Self {
        Self {
            enabled: true,
            email: ChannelPrefs::enabled_for_all(),
            realtime: ChannelPrefs::enabled_for_all(),
            quiet_hours: None,
            digest: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str, message: &str) -> NotificationRequest {
        NotificationRequest::builder()
            .recipient(Identity::user(Uuid::new_v4()))
            .notification_type(NotificationType::LowStock)
            .title(title)
            .message(message)
            .build()
    }

    #[test]
    fn content_hash_is_stable() {
        let a = request("Low stock: Blue Mug", "Only 3 left");
        let b = request("Low stock: Blue Mug", "Only 3 left");
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn content_hash_differs_per_product() {
        let a = request("Low stock: Blue Mug", "Only 3 left");
        let b = request("Low stock: Red Mug", "Only 3 left");
        assert_ne!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn category_falls_back_to_type_default() {
        let req = request("t", "m");
        assert_eq!(req.category(), NotificationCategory::Product);
    }

    #[test]
    fn category_override_wins() {
        let req = NotificationRequest::builder()
            .recipient(Identity::user(Uuid::new_v4()))
            .notification_type(NotificationType::LowStock)
            .category_override(NotificationCategory::System)
            .title("t")
            .message("m")
            .build();
        assert_eq!(req.category(), NotificationCategory::System);
    }

    #[test]
    fn super_admin_can_access_any_notification() {
        let owner = Identity::user(Uuid::new_v4());
        let admin = Identity {
            user_id: Uuid::new_v4(),
            role: Role::SuperAdmin,
        };
        let other = Identity::user(Uuid::new_v4());
        let notification = Notification::from_request(
            NotificationRequest::builder()
                .recipient(owner)
                .notification_type(NotificationType::General)
                .title("t")
                .message("m")
                .build(),
            Utc::now(),
        );
        assert!(notification.accessible_by(&owner));
        assert!(notification.accessible_by(&admin));
        assert!(!notification.accessible_by(&other));
    }

    #[test]
    fn from_request_starts_unread_with_skipped_outcomes() {
        let n = Notification::from_request(request("t", "m"), Utc::now());
        assert!(!n.read);
        assert_eq!(n.outcomes, ChannelOutcomes::default());
    }
}
