//! Sliding-window counters — the shared mechanism under both the rate
//! limiter and the spam/dedup guard.
//!
//! The requirement is "bounded recent-activity tracking per key". It lives
//! behind [`WindowStore`] so a single-instance deployment uses the in-memory
//! map and a multi-instance one can plug in a shared counter service without
//! touching pipeline logic.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

/// Result of a window admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowDecision {
    Allowed,
    Denied { retry_after: Duration },
}

impl WindowDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, WindowDecision::Allowed)
    }
}

/// Check one key's window. Prunes expired timestamps, then either records
/// the new event or reports how long until the oldest in-window event ages
/// out. Pruning on access amortizes cleanup; no separate GC pass needed.
pub fn check_window(
    entries: &mut Vec<Instant>,
    now: Instant,
    max: usize,
    window: Duration,
) -> WindowDecision {
    // checked_sub: the monotonic clock may not reach back a full window
    // right after boot; nothing can be expired then.
    if let Some(cutoff) = now.checked_sub(window) {
        entries.retain(|t| *t > cutoff);
    }
    if entries.len() >= max {
        let oldest = entries
            .iter()
            .min()
            .copied()
            .unwrap_or(now);
        let retry_after = window.saturating_sub(now.duration_since(oldest));
        return WindowDecision::Denied { retry_after };
    }
    entries.push(now);
    WindowDecision::Allowed
}

/// Bounded recent-activity tracking per key.
#[async_trait]
pub trait WindowStore: Send + Sync {
    async fn check(&self, key: &str, max: usize, window: Duration) -> WindowDecision;
}

/// Keys with no live entries are pruned once the map grows past this.
const PRUNE_THRESHOLD: usize = 10_000;

/// In-memory window store. Entries for different keys live in different
/// dashmap shards, so concurrent checks for different identities don't
/// contend on one lock.
#[derive(Debug, Default)]
pub struct MemoryWindowStore {
    windows: DashMap<String, Vec<Instant>>,
}

impl MemoryWindowStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn prune_if_large(&self, now: Instant, window: Duration) {
        if self.windows.len() > PRUNE_THRESHOLD {
            let Some(cutoff) = now.checked_sub(window) else {
                return;
            };
            self.windows.retain(|_, entries| {
                entries.retain(|t| *t > cutoff);
                !entries.is_empty()
            });
        }
    }
}

#[async_trait]
impl WindowStore for MemoryWindowStore {
    async fn check(&self, key: &str, max: usize, window: Duration) -> WindowDecision {
        let now = Instant::now();
        self.prune_if_large(now, window);
        let mut entries = self.windows.entry(key.to_string()).or_default();
        check_window(&mut entries, now, max, window)
    }
}
