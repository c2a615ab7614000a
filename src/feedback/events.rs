use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_util::task::TaskTracker;

use crate::api::RemoteApi;
use crate::feed::FeedManager;

use super::types::{ContentTags, EventBatch, EventKind, TrackedEvent};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

const ANONYMOUS_ID: &str = "anonymous";

/// Buffers typed engagement events and ships them in batches. A failed
/// batch is logged and dropped.
#[derive(Clone)]
pub struct EventTracker {
    api: Arc<dyn RemoteApi>,
    feed: FeedManager,
    timeout: Duration,
    batch_size: usize,
    buffer: Arc<Mutex<Vec<TrackedEvent>>>,
    tracker: TaskTracker,
}

impl EventTracker {
    pub fn new(
        api: Arc<dyn RemoteApi>,
        feed: FeedManager,
        timeout: Duration,
        batch_size: usize,
    ) -> Self {
        Self {
            api,
            feed,
            timeout,
            batch_size: batch_size.max(1),
            buffer: Arc::new(Mutex::new(Vec::new())),
            tracker: TaskTracker::new(),
        }
    }

    /// Buffer an event tagged with the current scenario.
    pub async fn track(&self, kind: EventKind, tags: ContentTags) {
        let mut event = TrackedEvent::new(kind, tags);
        if let Some(attribution) = self.feed.attribution().await {
            event = event.with_scenario(attribution.scenario);
        }
        self.push(event).await;
    }

    /// Buffer a prepared event. A full buffer is flushed in the background.
    pub async fn push(&self, event: TrackedEvent) {
        let full = {
            let mut buffer = self.buffer.lock().await;
            buffer.push(event);
            buffer.len() >= self.batch_size
        };
        if !full {
            return;
        }

        let Some(batch) = self.take_batch().await else {
            return;
        };
        let api = self.api.clone();
        let budget = self.timeout;
        self.tracker.spawn(async move {
            send_batch(api.as_ref(), batch, budget).await;
        });
    }

    /// Send whatever is buffered now. Returns how many events were handed
    /// to the service successfully.
    pub async fn flush(&self) -> usize {
        match self.take_batch().await {
            Some(batch) => send_batch(self.api.as_ref(), batch, self.timeout).await,
            None => 0,
        }
    }

    pub async fn pending(&self) -> usize {
        self.buffer.lock().await.len()
    }

    /// Flush, then wait for background batches.
    pub async fn shutdown(&self) {
        self.flush().await;
        self.tracker.close();
        self.tracker.wait().await;
    }

    async fn take_batch(&self) -> Option<EventBatch> {
        let events = std::mem::take(&mut *self.buffer.lock().await);
        if events.is_empty() {
            return None;
        }
        let fingerprint_id = self
            .feed
            .attribution()
            .await
            .map(|attribution| attribution.fingerprint_id)
            .unwrap_or_else(|| ANONYMOUS_ID.to_string());
        Some(EventBatch {
            fingerprint_id,
            events,
        })
    }
}

async fn send_batch(api: &dyn RemoteApi, batch: EventBatch, budget: Duration) -> usize {
    let count = batch.events.len();
    match timeout(budget, api.track_events(&batch)).await {
        Ok(Ok(())) => {
            log_debug!("sent {count} events");
            count
        }
        Ok(Err(err)) => {
            log_warn!("dropped {count} events: {err}");
            0
        }
        Err(_) => {
            log_warn!("dropped {count} events after {budget:?}");
            0
        }
    }
}
