//! Session history data model.
//!
//! Soft counters feeding the app-usage signals and the fingerprint's
//! behavioral bucket. Nothing here carries cross-key invariants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionHistory {
    pub session_count: u32,
    pub total_time_ms: u64,
    pub first_seen_at: DateTime<Utc>,
    pub last_started_at: Option<DateTime<Utc>>,
    /// Newest first, capped by `session_history_cap`.
    pub recent_starts: Vec<DateTime<Utc>>,
}

impl SessionHistory {
    pub fn days_since_install(&self, now: DateTime<Utc>) -> u32 {
        (now - self.first_seen_at).num_days().max(0) as u32
    }
}
