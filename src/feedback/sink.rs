use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;
use tokio_util::task::TaskTracker;

use crate::api::RemoteApi;
use crate::db::{Database, FeedbackEntry};
use crate::feed::FeedManager;

use super::types::{ContentTags, FeedbackEvent, FeedbackRequest, Polarity};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

pub const UNATTRIBUTED_SCENARIO: &str = "unattributed";

/// Persists thumbs up/down locally and forwards them best-effort. The local
/// row is what the UI shows; remote sends are never awaited by callers.
#[derive(Clone)]
pub struct FeedbackSink {
    db: Database,
    api: Arc<dyn RemoteApi>,
    feed: FeedManager,
    timeout: Duration,
    tracker: TaskTracker,
}

impl FeedbackSink {
    pub fn new(
        db: Database,
        api: Arc<dyn RemoteApi>,
        feed: FeedManager,
        timeout: Duration,
    ) -> Self {
        Self {
            db,
            api,
            feed,
            timeout,
            tracker: TaskTracker::new(),
        }
    }

    /// Record feedback against the scenario of the loaded feed.
    pub async fn record(
        &self,
        action: &str,
        polarity: Polarity,
        tags: ContentTags,
    ) -> Option<Polarity> {
        let attribution = self.feed.attribution().await;
        let (scenario, fingerprint_id) = match attribution {
            Some(attribution) => (attribution.scenario, Some(attribution.fingerprint_id)),
            None => (UNATTRIBUTED_SCENARIO.to_string(), None),
        };

        let event = FeedbackEvent {
            action: action.to_string(),
            scenario,
            polarity,
            tags,
            timestamp: Utc::now(),
        };
        self.record_event(event, fingerprint_id.as_deref()).await
    }

    /// Toggle the stored polarity for the event's `(scenario, action)` and
    /// return the new local state. Repeating the stored polarity clears it,
    /// and only a set polarity is sent remotely.
    pub async fn record_event(
        &self,
        event: FeedbackEvent,
        fingerprint_id: Option<&str>,
    ) -> Option<Polarity> {
        let current = self.state(&event.scenario, &event.action).await;
        let next = if current == Some(event.polarity) {
            None
        } else {
            Some(event.polarity)
        };

        let persisted = match next {
            Some(polarity) => {
                self.db
                    .upsert_feedback(&FeedbackEntry {
                        scenario: event.scenario.clone(),
                        action: event.action.clone(),
                        polarity,
                        category: event.tags.category.clone(),
                        content_type: event.tags.content_type.clone(),
                        source: event.tags.source.clone(),
                        updated_at: event.timestamp,
                    })
                    .await
            }
            None => self.db.clear_feedback(&event.scenario, &event.action).await,
        };
        if let Err(err) = persisted {
            log_warn!(
                "failed to persist feedback for {}/{}: {err:#}",
                event.scenario,
                event.action
            );
        }

        match (next, fingerprint_id) {
            (Some(_), Some(fingerprint_id)) => {
                self.send_in_background(FeedbackRequest::new(fingerprint_id, &event));
            }
            (Some(_), None) => {
                log_debug!("no identity yet, keeping feedback for {} local", event.action);
            }
            (None, _) => {
                log_debug!("cleared feedback for {}/{}", event.scenario, event.action);
            }
        }

        next
    }

    /// Stored polarity, or none when unset or unreadable.
    pub async fn state(&self, scenario: &str, action: &str) -> Option<Polarity> {
        match self.db.feedback_polarity(scenario, action).await {
            Ok(polarity) => polarity,
            Err(err) => {
                log_warn!("failed to read feedback for {scenario}/{action}: {err:#}");
                None
            }
        }
    }

    /// Every stored polarity, newest first.
    pub async fn history(&self) -> Vec<FeedbackEntry> {
        match self.db.list_feedback().await {
            Ok(entries) => entries,
            Err(err) => {
                log_warn!("failed to list feedback: {err:#}");
                Vec::new()
            }
        }
    }

    fn send_in_background(&self, request: FeedbackRequest) {
        let api = self.api.clone();
        let budget = self.timeout;
        self.tracker.spawn(async move {
            match timeout(budget, api.send_feedback(&request)).await {
                Ok(Ok(ack)) => log_info!(
                    "feedback for {} delivered (learning applied: {})",
                    request.suggestion_action,
                    ack.learning_applied
                ),
                Ok(Err(err)) => log_warn!(
                    "feedback for {} dropped: {err}",
                    request.suggestion_action
                ),
                Err(_) => log_warn!(
                    "feedback for {} dropped after {budget:?}",
                    request.suggestion_action
                ),
            }
        });
    }

    /// Wait for outstanding sends. New sends after this still run but are
    /// no longer awaited.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}
