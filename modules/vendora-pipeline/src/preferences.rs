//! Per-user channel resolution.
//!
//! Precedence, most to least specific: type override, category override,
//! channel default. The global flag wins over everything. Quiet hours are
//! computed independently and defer (not drop) the immediate channels.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use vendora_common::{
    ChannelPrefs, NotificationCategory, NotificationRequest, NotificationType, PreferenceProfile,
    QuietHours,
};

/// Which channels a surviving request goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelDecision {
    /// Persisted in-app record. On for every accepted request — it is the
    /// durable copy the other channels fall back to.
    pub store: bool,
    pub email: bool,
    pub realtime: bool,
    /// Inside the recipient's quiet hours. The store record persists;
    /// email/realtime are suppressed until the window ends.
    pub deferred: bool,
}

impl ChannelDecision {
    pub fn nothing() -> Self {
        Self {
            store: false,
            email: false,
            realtime: false,
            deferred: false,
        }
    }
}

fn channel_enabled(
    prefs: &ChannelPrefs,
    notification_type: NotificationType,
    category: NotificationCategory,
) -> bool {
    let mut enabled = prefs.enabled;
    if let Some(v) = prefs.by_category.get(&category) {
        enabled = *v;
    }
    if let Some(v) = prefs.by_type.get(&notification_type) {
        enabled = *v;
    }
    enabled
}

/// Whether `now` falls inside the quiet window, evaluated on the profile's
/// local clock. The interval is `[start, end)`; `start > end` wraps past
/// midnight.
pub fn in_quiet_hours(quiet: &QuietHours, now: DateTime<Utc>) -> bool {
    let offset = FixedOffset::east_opt(quiet.utc_offset_minutes * 60)
        .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
    let local = now.with_timezone(&offset).time();

    if quiet.start <= quiet.end {
        local >= quiet.start && local < quiet.end
    } else {
        local >= quiet.start || local < quiet.end
    }
}

/// Resolve the delivery channels for `request` under `profile` at `now`.
pub fn resolve_channels(
    request: &NotificationRequest,
    profile: &PreferenceProfile,
    now: DateTime<Utc>,
) -> ChannelDecision {
    if !profile.enabled {
        return ChannelDecision::nothing();
    }

    let notification_type = request.notification_type;
    let category = request.category();

    ChannelDecision {
        store: true,
        email: channel_enabled(&profile.email, notification_type, category),
        realtime: channel_enabled(&profile.realtime, notification_type, category),
        deferred: profile
            .quiet_hours
            .as_ref()
            .is_some_and(|q| in_quiet_hours(q, now)),
    }
}

/// External preference service contract. The pipeline reads profiles and
/// email addresses; it never writes them.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn profile(&self, user_id: Uuid) -> anyhow::Result<PreferenceProfile>;
    async fn email_address(&self, user_id: Uuid) -> anyhow::Result<Option<String>>;
}

/// In-memory profile source. Unknown users get the platform default
/// profile. Used in tests and single-tenant dev setups.
#[derive(Default)]
pub struct MemoryProfiles {
    profiles: RwLock<HashMap<Uuid, PreferenceProfile>>,
    addresses: RwLock<HashMap<Uuid, String>>,
}

impl MemoryProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_profile(&self, user_id: Uuid, profile: PreferenceProfile) {
        self.profiles.write().insert(user_id, profile);
    }

    pub fn set_email_address(&self, user_id: Uuid, address: impl Into<String>) {
        self.addresses.write().insert(user_id, address.into());
    }
}

#[async_trait]
impl ProfileSource for MemoryProfiles {
    async fn profile(&self, user_id: Uuid) -> anyhow::Result<PreferenceProfile> {
        Ok(self
            .profiles
            .read()
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn email_address(&self, user_id: Uuid) -> anyhow::Result<Option<String>> {
        Ok(self.addresses.read().get(&user_id).cloned())
    }
}
