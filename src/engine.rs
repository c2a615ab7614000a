//! Host-facing entry point wiring collector, deriver, gateway, feed and
//! feedback together. Every operation after `open` is infallible.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::api::RemoteApi;
use crate::db::{Database, FeedbackEntry};
use crate::feed::{FeedManager, FeedPhase, FetchContext, RecommendationCard, SwipeDirection};
use crate::feedback::{ContentTags, EventKind, EventTracker, FeedbackSink, Polarity, TrackedEvent};
use crate::fingerprint::{Fingerprint, FingerprintDeriver};
use crate::inference::{InferenceGateway, InferenceResult};
use crate::settings::EngineSettings;
use crate::signals::{Platform, SignalCollector};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const DB_FILE_NAME: &str = "context_engine.sqlite3";

pub struct ContextEngine {
    settings: EngineSettings,
    db: Database,
    api: Arc<dyn RemoteApi>,
    collector: SignalCollector,
    deriver: FingerprintDeriver,
    gateway: InferenceGateway,
    feed: FeedManager,
    feedback: FeedbackSink,
    events: EventTracker,
}

impl ContextEngine {
    pub fn open(
        data_dir: impl AsRef<Path>,
        settings: EngineSettings,
        platform: Arc<dyn Platform>,
        api: Arc<dyn RemoteApi>,
    ) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;
        let db = Database::new(data_dir.join(DB_FILE_NAME))?;

        let gateway = InferenceGateway::new(api.clone(), settings.inference_timeout());
        let feed = FeedManager::new(
            gateway.clone(),
            settings.low_watermark,
            settings.max_empty_prefetches,
        );
        let feedback = FeedbackSink::new(
            db.clone(),
            api.clone(),
            feed.clone(),
            settings.feedback_timeout(),
        );
        let events = EventTracker::new(
            api.clone(),
            feed.clone(),
            settings.feedback_timeout(),
            settings.event_batch_size,
        );

        Ok(Self {
            collector: SignalCollector::new(platform, db.clone(), settings.probe_timeout()),
            deriver: FingerprintDeriver::new(db.clone()),
            settings,
            db,
            api,
            gateway,
            feed,
            feedback,
            events,
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Location of the local store.
    pub fn store_path(&self) -> &Path {
        self.db.path()
    }

    /// Start a session: snapshot the device, refresh the identity, ask for
    /// a decision and load the feed from it.
    pub async fn initialize(&self) -> InferenceResult {
        if let Err(err) = self
            .db
            .record_session_start(Utc::now(), self.settings.session_history_cap)
            .await
        {
            log_warn!("failed to record session start: {err:#}");
        }

        let snapshot = self.collector.collect().await;
        let fingerprint = self.deriver.derive_or_update(&snapshot, false).await;
        let journey_day = fingerprint.journey_day(Utc::now());

        let result = self.gateway.infer(&snapshot, &fingerprint, journey_day).await;
        log_info!(
            "session {} for {} on journey day {}: {} mode via {:?}",
            fingerprint.session_count,
            fingerprint.master_id,
            journey_day,
            result.mode.as_str(),
            result.source
        );

        self.feed
            .load(
                &result,
                FetchContext {
                    snapshot,
                    fingerprint,
                    journey_day,
                },
            )
            .await;

        self.events
            .track(EventKind::SessionStart, ContentTags::default())
            .await;
        self.track_head_view().await;

        result
    }

    /// Decide on the head card. Right is a like, left a dislike.
    pub async fn swipe(&self, direction: SwipeDirection) -> Option<RecommendationCard> {
        let card = self.feed.swipe(direction).await?;
        self.events
            .track(direction.polarity().into(), card.tags())
            .await;
        self.track_head_view().await;
        Some(card)
    }

    pub async fn current_cards(&self) -> Vec<RecommendationCard> {
        self.feed.current_cards().await
    }

    pub async fn feed_phase(&self) -> FeedPhase {
        self.feed.phase().await
    }

    /// "See again": the session's original cards with nothing marked seen.
    pub async fn reset_feed(&self) -> Vec<RecommendationCard> {
        self.feed.reset().await;
        self.track_head_view().await;
        self.feed.current_cards().await
    }

    /// Toggle thumbs up/down on a suggestion. Returns the new local state.
    pub async fn give_feedback(
        &self,
        action: &str,
        polarity: Polarity,
        tags: ContentTags,
    ) -> Option<Polarity> {
        self.feedback.record(action, polarity, tags).await
    }

    pub async fn feedback_state(&self, scenario: &str, action: &str) -> Option<Polarity> {
        self.feedback.state(scenario, action).await
    }

    pub async fn feedback_history(&self) -> Vec<FeedbackEntry> {
        self.feedback.history().await
    }

    /// Store answers and fold recognized ones into the fingerprint labels.
    pub async fn submit_questionnaire(
        &self,
        answers: BTreeMap<String, String>,
    ) -> Option<Fingerprint> {
        if let Err(err) = self
            .db
            .save_questionnaire_answers(answers.clone(), Utc::now())
            .await
        {
            log_warn!("failed to store questionnaire answers: {err:#}");
        }
        self.deriver.merge_questionnaire(&answers).await
    }

    pub async fn end_session(&self, duration: Duration) {
        let duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        if let Err(err) = self.db.record_session_end(duration_ms).await {
            log_warn!("failed to record session end: {err:#}");
        }
        let mut event = TrackedEvent::new(EventKind::SessionEnd, ContentTags::default())
            .with_duration_ms(duration_ms);
        if let Some(attribution) = self.feed.attribution().await {
            event = event.with_scenario(attribution.scenario);
        }
        self.events.push(event).await;
    }

    pub async fn service_reachable(&self) -> bool {
        self.api.check_health().await
    }

    /// Flush events and wait for outstanding sends. Best effort.
    pub async fn shutdown(&self) {
        self.events.shutdown().await;
        self.feedback.shutdown().await;
        log_info!("context engine shut down");
    }

    async fn track_head_view(&self) {
        if let Some(head) = self.feed.head().await {
            self.events.track(EventKind::View, head.tags()).await;
        }
    }
}
