use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::feedback::{EventBatch, FeedbackAck, FeedbackRequest};
use crate::inference::{InferenceRequest, RemoteDecision, Suggestion, SuggestionContent};

use super::{ApiError, RemoteApi};

/// Replays queued decisions in order and records everything sent to it.
/// An empty queue answers with a network error.
#[derive(Default)]
pub(crate) struct ScriptedApi {
    decisions: Mutex<VecDeque<Result<RemoteDecision, ApiError>>>,
    hang: bool,
    gate: Option<Arc<Notify>>,
    failing_sends: bool,
    decide_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: Mutex<Vec<InferenceRequest>>,
    feedback: Mutex<Vec<FeedbackRequest>>,
    events: Mutex<Vec<EventBatch>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decision(self, decision: RemoteDecision) -> Self {
        self.push(Ok(decision));
        self
    }

    pub fn with_error(self, err: ApiError) -> Self {
        self.push(Err(err));
        self
    }

    /// `decide` never completes.
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    /// `decide` waits for one `notify_one` on `gate` before answering.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Feedback and event sends fail with a server error.
    pub fn failing_sends(mut self) -> Self {
        self.failing_sends = true;
        self
    }

    pub fn push(&self, response: Result<RemoteDecision, ApiError>) {
        self.decisions.lock().unwrap().push_back(response);
    }

    pub fn decide_calls(&self) -> usize {
        self.decide_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<InferenceRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn feedback_requests(&self) -> Vec<FeedbackRequest> {
        self.feedback.lock().unwrap().clone()
    }

    pub fn event_batches(&self) -> Vec<EventBatch> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RemoteApi for ScriptedApi {
    async fn decide(&self, request: &InferenceRequest) -> Result<RemoteDecision, ApiError> {
        self.decide_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if self.hang {
            std::future::pending::<()>().await;
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let response = self
            .decisions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("no scripted response".into())));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }

    async fn send_feedback(&self, request: &FeedbackRequest) -> Result<FeedbackAck, ApiError> {
        self.feedback.lock().unwrap().push(request.clone());
        if self.failing_sends {
            return Err(ApiError::Server {
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(FeedbackAck {
            success: true,
            learning_applied: true,
        })
    }

    async fn track_events(&self, batch: &EventBatch) -> Result<(), ApiError> {
        self.events.lock().unwrap().push(batch.clone());
        if self.failing_sends {
            return Err(ApiError::Network("connection reset".into()));
        }
        Ok(())
    }

    async fn check_health(&self) -> bool {
        !self.failing_sends
    }
}

/// A remote decision whose suggestions carry the given ids.
pub(crate) fn decision_with(scenario: &str, ids: &[&str]) -> RemoteDecision {
    RemoteDecision {
        mode: "standard".into(),
        greeting: "Namaste".into(),
        suggestions: ids
            .iter()
            .enumerate()
            .map(|(idx, id)| Suggestion {
                id: Some(id.to_string()),
                action: Some(format!("open_{id}")),
                title: format!("Card {id}"),
                description: format!("About {id}"),
                icon: "star".into(),
                priority: idx as u8 + 1,
                content: Some(SuggestionContent {
                    deep_link: Some(format!("app://{id}")),
                    fallback_url: Some(format!("https://example.in/{id}")),
                    source: Some("partner".into()),
                    category: Some("news".into()),
                    content_type: Some("article".into()),
                }),
            })
            .collect(),
        reasoning: vec!["matched by test".into()],
        matched_scenario: scenario.into(),
        confidence: 0.8,
        ..RemoteDecision::default()
    }
}
