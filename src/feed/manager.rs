use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::feedback::Polarity;
use crate::fingerprint::Fingerprint;
use crate::inference::{InferenceGateway, InferenceResult};
use crate::signals::SignalSnapshot;

use super::card::{cards_from, RecommendationCard};
use super::queue::FeedQueue;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SwipeDirection {
    Left,
    Right,
}

impl SwipeDirection {
    pub fn polarity(&self) -> Polarity {
        match self {
            SwipeDirection::Right => Polarity::Like,
            SwipeDirection::Left => Polarity::Dislike,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FeedPhase {
    Empty,
    Loaded,
    Fetching,
    /// The deck is empty and recent prefetches brought nothing new; no more
    /// are issued until a reset or a fresh load.
    Exhausted,
}

/// Scenario and identity of the loaded feed, credited with feedback on its
/// cards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attribution {
    pub scenario: String,
    pub fingerprint_id: String,
}

/// Inputs a prefetch replays against the gateway.
#[derive(Debug, Clone)]
pub struct FetchContext {
    pub snapshot: SignalSnapshot,
    pub fingerprint: Fingerprint,
    pub journey_day: u32,
}

struct FeedInner {
    gateway: InferenceGateway,
    low_watermark: usize,
    max_empty_prefetches: u32,
    queue: Mutex<FeedQueue>,
    context: Mutex<Option<FetchContext>>,
    attribution: Mutex<Option<Attribution>>,
    fetching: AtomicBool,
    empty_streak: AtomicU32,
    generation: AtomicU64,
    prefetch: Mutex<Option<JoinHandle<()>>>,
}

/// Clears the in-flight flag however the prefetch task ends.
struct FlightGuard(Arc<FeedInner>);

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.0.fetching.store(false, Ordering::Release);
    }
}

/// Swipeable card queue refilled in the background once it runs low.
/// At most one prefetch is in flight at any time.
#[derive(Clone)]
pub struct FeedManager {
    inner: Arc<FeedInner>,
}

impl FeedManager {
    pub fn new(
        gateway: InferenceGateway,
        low_watermark: usize,
        max_empty_prefetches: u32,
    ) -> Self {
        Self {
            inner: Arc::new(FeedInner {
                gateway,
                low_watermark,
                max_empty_prefetches: max_empty_prefetches.max(1),
                queue: Mutex::new(FeedQueue::new()),
                context: Mutex::new(None),
                attribution: Mutex::new(None),
                fetching: AtomicBool::new(false),
                empty_streak: AtomicU32::new(0),
                generation: AtomicU64::new(0),
                prefetch: Mutex::new(None),
            }),
        }
    }

    /// Start a new session feed from `result`. Any prefetch still running
    /// for the previous load is discarded when it lands.
    pub async fn load(&self, result: &InferenceResult, context: FetchContext) {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.empty_streak.store(0, Ordering::Release);
        *self.inner.attribution.lock().await = Some(Attribution {
            scenario: result.matched_scenario.clone(),
            fingerprint_id: context.fingerprint.master_id.clone(),
        });
        *self.inner.context.lock().await = Some(context);

        let mut queue = self.inner.queue.lock().await;
        queue.load(cards_from(&result.suggestions));
        log_info!(
            "feed loaded with {} cards for '{}'",
            queue.len(),
            result.matched_scenario
        );
    }

    /// Take the head card. Running at or below the low watermark afterwards
    /// kicks off a background prefetch unless one is already running.
    pub async fn swipe(&self, direction: SwipeDirection) -> Option<RecommendationCard> {
        let (card, remaining) = {
            let mut queue = self.inner.queue.lock().await;
            let card = queue.swipe();
            (card, queue.len())
        };

        if let Some(card) = &card {
            log_debug!("swiped {:?} on {} ({} left)", direction, card.id, remaining);
        }

        if remaining <= self.inner.low_watermark {
            self.maybe_prefetch().await;
        }

        card
    }

    pub async fn current_cards(&self) -> Vec<RecommendationCard> {
        self.inner.queue.lock().await.cards()
    }

    /// Scenario of the loaded result. Prefetches never change it.
    pub async fn attribution(&self) -> Option<Attribution> {
        self.inner.attribution.lock().await.clone()
    }

    pub async fn head(&self) -> Option<RecommendationCard> {
        self.inner.queue.lock().await.head().cloned()
    }

    /// Show the original list again with a cleared seen-set.
    pub async fn reset(&self) -> usize {
        self.inner.empty_streak.store(0, Ordering::Release);
        let mut queue = self.inner.queue.lock().await;
        queue.reset();
        queue.len()
    }

    pub async fn phase(&self) -> FeedPhase {
        if self.inner.fetching.load(Ordering::Acquire) {
            return FeedPhase::Fetching;
        }
        if !self.inner.queue.lock().await.is_empty() {
            FeedPhase::Loaded
        } else if self.is_exhausted() {
            FeedPhase::Exhausted
        } else {
            FeedPhase::Empty
        }
    }

    /// Wait for the running prefetch, if any, to finish merging.
    pub async fn wait_for_prefetch(&self) {
        let handle = self.inner.prefetch.lock().await.take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                log_warn!("feed prefetch task ended abnormally: {err}");
            }
        }
    }

    fn is_exhausted(&self) -> bool {
        self.inner.empty_streak.load(Ordering::Acquire) >= self.inner.max_empty_prefetches
    }

    /// Returns true when a new prefetch was started.
    async fn maybe_prefetch(&self) -> bool {
        if self.is_exhausted() {
            log_debug!("feed exhausted, skipping prefetch");
            return false;
        }
        if self
            .inner
            .fetching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log_debug!("prefetch already in flight");
            return false;
        }

        let guard = FlightGuard(self.inner.clone());
        let Some(context) = self.inner.context.lock().await.clone() else {
            return false;
        };
        let generation = self.inner.generation.load(Ordering::Acquire);
        let inner = self.inner.clone();

        let handle = tokio::spawn(async move {
            let _guard = guard;
            let result = inner
                .gateway
                .infer(&context.snapshot, &context.fingerprint, context.journey_day)
                .await;

            if inner.generation.load(Ordering::Acquire) != generation {
                log_debug!("discarding prefetch for a superseded feed");
                return;
            }

            // Offline placeholders are not new content, and an outage says
            // nothing about whether the service has more to offer.
            if result.is_fail_open() {
                log_info!("prefetch failed open, will retry on the next swipe");
                return;
            }

            let added = inner.queue.lock().await.merge(cards_from(&result.suggestions));
            if added == 0 {
                let streak = inner.empty_streak.fetch_add(1, Ordering::AcqRel) + 1;
                log_info!(
                    "prefetch brought no new cards ({streak}/{})",
                    inner.max_empty_prefetches
                );
            } else {
                inner.empty_streak.store(0, Ordering::Release);
                log_debug!("prefetch appended {added} cards");
            }
        });

        *self.inner.prefetch.lock().await = Some(handle);
        true
    }
}
