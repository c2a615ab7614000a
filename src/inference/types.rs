use serde::{Deserialize, Serialize};

use crate::signals::SignalSnapshot;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UiMode {
    Lite,
    Standard,
    Rich,
}

impl UiMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lite" => Some(UiMode::Lite),
            "standard" => Some(UiMode::Standard),
            "rich" => Some(UiMode::Rich),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UiMode::Lite => "lite",
            UiMode::Standard => "standard",
            UiMode::Rich => "rich",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Persona {
    pub id: String,
    pub label: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum JourneyStage {
    #[default]
    Newcomer,
    Explorer,
    Regular,
    Partner,
}

impl JourneyStage {
    pub fn from_day(day: u32) -> Self {
        match day {
            0..=1 => JourneyStage::Newcomer,
            2..=7 => JourneyStage::Explorer,
            8..=30 => JourneyStage::Regular,
            _ => JourneyStage::Partner,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Journey {
    pub day: u32,
    pub stage: JourneyStage,
    pub insights: Vec<String>,
    pub value_delivered: Vec<String>,
    pub next_milestone: Option<String>,
}

impl Journey {
    pub fn for_day(day: u32) -> Self {
        Self {
            day,
            stage: JourneyStage::from_day(day),
            ..Self::default()
        }
    }
}

/// Optional deep-link block attached to a suggestion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SuggestionContent {
    pub deep_link: Option<String>,
    pub fallback_url: Option<String>,
    pub source: Option<String>,
    pub category: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Suggestion {
    pub id: Option<String>,
    pub action: Option<String>,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub priority: u8,
    pub content: Option<SuggestionContent>,
}

/// Body of `POST /v1/init`: the nested signal groups plus identity.
#[derive(Debug, Clone, Serialize)]
pub struct InferenceRequest {
    #[serde(flatten)]
    pub signals: SignalSnapshot,
    pub fingerprint_id: String,
    pub journey_day: u32,
}

/// Response of `POST /v1/init` as the service sends it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteDecision {
    pub mode: String,
    pub persona: Persona,
    pub greeting: String,
    pub message: String,
    pub suggestions: Vec<Suggestion>,
    pub journey: Option<Journey>,
    pub reasoning: Vec<String>,
    pub matched_scenario: String,
    pub confidence: f64,
    pub intelligence_summary: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Network,
    Server,
    Decode,
}

impl FailureKind {
    pub fn describe(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "the service took too long to answer",
            FailureKind::Network => "the service could not be reached",
            FailureKind::Server => "the service returned an error",
            FailureKind::Decode => "the service sent an unreadable answer",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InferenceSource {
    Remote,
    FailOpen { reason: FailureKind },
}

/// Personalization decision handed to the UI, whichever path produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InferenceResult {
    pub source: InferenceSource,
    pub mode: UiMode,
    pub persona: Persona,
    pub greeting: String,
    pub message: String,
    pub suggestions: Vec<Suggestion>,
    pub journey: Journey,
    pub reasoning: Vec<String>,
    pub matched_scenario: String,
    pub confidence: f64,
    pub intelligence_summary: Option<serde_json::Value>,
}

impl InferenceResult {
    pub fn from_remote(decision: RemoteDecision, journey_day: u32) -> Self {
        let mode = UiMode::parse(&decision.mode).unwrap_or(UiMode::Standard);
        let confidence = if decision.confidence.is_finite() {
            decision.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            source: InferenceSource::Remote,
            mode,
            persona: decision.persona,
            greeting: decision.greeting,
            message: decision.message,
            suggestions: decision.suggestions,
            journey: decision
                .journey
                .unwrap_or_else(|| Journey::for_day(journey_day)),
            reasoning: decision.reasoning,
            matched_scenario: decision.matched_scenario,
            confidence,
            intelligence_summary: decision.intelligence_summary,
        }
    }

    pub fn is_fail_open(&self) -> bool {
        matches!(self.source, InferenceSource::FailOpen { .. })
    }
}
