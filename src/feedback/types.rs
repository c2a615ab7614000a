use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Like,
    Dislike,
}

impl Polarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Like => "like",
            Polarity::Dislike => "dislike",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "like" => Some(Polarity::Like),
            "dislike" => Some(Polarity::Dislike),
            _ => None,
        }
    }
}

/// Optional content tags carried by feedback and tracked events.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ContentTags {
    pub category: Option<String>,
    pub content_type: Option<String>,
    pub source: Option<String>,
}

/// One like/dislike decision on a suggestion within a scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackEvent {
    pub action: String,
    pub scenario: String,
    pub polarity: Polarity,
    pub tags: ContentTags,
    pub timestamp: DateTime<Utc>,
}

/// Body of `POST /v1/feedback`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackRequest {
    pub fingerprint_id: String,
    pub suggestion_action: String,
    pub scenario: String,
    pub feedback: Polarity,
    pub category: Option<String>,
    pub content_type: Option<String>,
    pub source: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl FeedbackRequest {
    pub fn new(fingerprint_id: impl Into<String>, event: &FeedbackEvent) -> Self {
        Self {
            fingerprint_id: fingerprint_id.into(),
            suggestion_action: event.action.clone(),
            scenario: event.scenario.clone(),
            feedback: event.polarity,
            category: event.tags.category.clone(),
            content_type: event.tags.content_type.clone(),
            source: event.tags.source.clone(),
            timestamp: event.timestamp,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FeedbackAck {
    pub success: bool,
    pub learning_applied: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    View,
    Click,
    Like,
    Dislike,
    Share,
    Purchase,
    SessionStart,
    SessionEnd,
    SuggestionAction,
}

impl From<Polarity> for EventKind {
    fn from(polarity: Polarity) -> Self {
        match polarity {
            Polarity::Like => EventKind::Like,
            Polarity::Dislike => EventKind::Dislike,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackedEvent {
    /// Lets the service drop a batch it already ingested.
    pub event_id: Uuid,
    pub event_type: EventKind,
    #[serde(flatten)]
    pub tags: ContentTags,
    pub scenario: Option<String>,
    pub duration_ms: Option<u64>,
    pub value: Option<f64>,
    pub metadata: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl TrackedEvent {
    pub fn new(event_type: EventKind, tags: ContentTags) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type,
            tags,
            scenario: None,
            duration_ms: None,
            value: None,
            metadata: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = Some(scenario.into());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// Body of `POST /v1/events`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventBatch {
    pub fingerprint_id: String,
    pub events: Vec<TrackedEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tracked_event_flattens_tags() {
        let event = TrackedEvent::new(
            EventKind::SuggestionAction,
            ContentTags {
                category: Some("cricket".into()),
                ..ContentTags::default()
            },
        )
        .with_scenario("commute_morning");

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event_type"], json!("suggestion_action"));
        assert_eq!(value["category"], json!("cricket"));
        assert_eq!(value["scenario"], json!("commute_morning"));
        assert!(value.get("tags").is_none());
    }

    #[test]
    fn polarity_round_trips_through_its_label() {
        for polarity in [Polarity::Like, Polarity::Dislike] {
            assert_eq!(Polarity::parse(polarity.as_str()), Some(polarity));
        }
        assert_eq!(Polarity::parse("meh"), None);
    }
}
