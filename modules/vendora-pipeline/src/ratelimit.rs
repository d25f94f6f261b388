//! Per-identity request throttle. Protects pipeline capacity against any
//! high-frequency caller, independent of content similarity (that's the
//! dedup guard's job).

use std::sync::Arc;
use std::time::Duration;

use vendora_common::{Identity, NotifyError};

use crate::window::{WindowDecision, WindowStore};

pub struct RateLimiter {
    windows: Arc<dyn WindowStore>,
    max: usize,
    window: Duration,
    exempt_super_admin: bool,
}

impl RateLimiter {
    pub fn new(
        windows: Arc<dyn WindowStore>,
        max: usize,
        window: Duration,
        exempt_super_admin: bool,
    ) -> Self {
        Self {
            windows,
            max,
            window,
            exempt_super_admin,
        }
    }

    /// Admit or throttle one request for `identity`.
    pub async fn allow(&self, identity: &Identity) -> Result<(), NotifyError> {
        if self.exempt_super_admin && identity.role.is_super_admin() {
            return Ok(());
        }
        let key = identity.user_id.to_string();
        match self.windows.check(&key, self.max, self.window).await {
            WindowDecision::Allowed => Ok(()),
            WindowDecision::Denied { retry_after } => Err(NotifyError::Throttled {
                retry_after_secs: retry_after.as_secs().max(1),
            }),
        }
    }
}
