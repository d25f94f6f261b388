//! Background TTL sweep. Runs on its own cadence, fully decoupled from the
//! dispatch path — a slow sweep never blocks a live notification.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::store::NotificationStore;

pub fn spawn_ttl_sweeper(
    store: Arc<dyn NotificationStore>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match store.delete_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(count) => info!(count, "swept expired notifications"),
                Err(e) => warn!(error = %e, "expired-notification sweep failed"),
            }
        }
    })
}
