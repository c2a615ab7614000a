use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::feedback::Polarity;

/// Locally persisted polarity for one `(scenario, action)` pair. This row,
/// not the remote service, drives toggled UI state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntry {
    pub scenario: String,
    pub action: String,
    pub polarity: Polarity,
    pub category: Option<String>,
    pub content_type: Option<String>,
    pub source: Option<String>,
    pub updated_at: DateTime<Utc>,
}
