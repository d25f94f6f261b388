use std::sync::Arc;

use vendora_pipeline::{Dispatcher, RateLimiter};
use vendora_realtime::JwtService;
use vendora_store::NotificationStore;

pub struct AppState {
    pub dispatcher: Dispatcher,
    pub store: Arc<dyn NotificationStore>,
    pub jwt: JwtService,
    /// General-operations limiter (list/read/delete), separate from the
    /// stricter creation limiter inside the dispatcher.
    pub general_limiter: Arc<RateLimiter>,
}
