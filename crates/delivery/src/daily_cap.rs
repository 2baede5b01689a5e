//! Per-account daily send caps over a rolling 24h window.
//!
//! Best-effort by design: the check and the record are not held under one
//! lock across a sweep, so racing sweeps may overshoot a cap by a handful of
//! messages. That trade-off is accepted; the cap protects sender reputation,
//! not an invariant.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

pub struct DailyCapTracker {
    sends: DashMap<Uuid, Vec<DateTime<Utc>>>,
}

impl DailyCapTracker {
    pub fn new() -> Self {
        Self {
            sends: DashMap::new(),
        }
    }

    /// Whether the account is under its cap at `now`.
    pub fn can_send(&self, account_id: Uuid, cap: u32, now: DateTime<Utc>) -> bool {
        self.sends_in_window(account_id, now) < cap
    }

    pub fn record_send(&self, account_id: Uuid, now: DateTime<Utc>) {
        let mut entry = self.sends.entry(account_id).or_default();
        // Drop timestamps that fell out of the window while we hold the entry.
        let window_start = now - Duration::hours(24);
        entry.retain(|t| *t >= window_start);
        entry.push(now);
        debug!(account_id = %account_id, count = entry.len(), "Send recorded against daily cap");
    }

    /// Sends counted against the cap in the 24h window ending at `now`.
    pub fn sends_in_window(&self, account_id: Uuid, now: DateTime<Utc>) -> u32 {
        let window_start = now - Duration::hours(24);
        self.sends
            .get(&account_id)
            .map(|sends| sends.iter().filter(|t| **t >= window_start).count() as u32)
            .unwrap_or(0)
    }
}

impl Default for DailyCapTracker {
    fn default() -> Self {
        Self::new()
    }
}
