use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::{timeout, Instant};

use crate::api::{ApiError, RemoteApi};
use crate::fingerprint::Fingerprint;
use crate::signals::SignalSnapshot;

use super::fallback::synthesize;
use super::types::{FailureKind, InferenceRequest, InferenceResult};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum GatewayPhase {
    #[default]
    Idle,
    Requesting,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", content = "reason", rename_all = "camelCase")]
pub enum Outcome {
    Success,
    FailedOpen(FailureKind),
}

#[derive(Debug, Default)]
struct GatewayState {
    phase: GatewayPhase,
    in_flight: usize,
    last_outcome: Option<Outcome>,
}

/// Asks the remote service for a decision under a hard deadline and falls
/// back to local synthesis on any failure. `infer` always yields a result.
#[derive(Clone)]
pub struct InferenceGateway {
    api: Arc<dyn RemoteApi>,
    timeout: Duration,
    state: Arc<RwLock<GatewayState>>,
}

impl InferenceGateway {
    pub fn new(api: Arc<dyn RemoteApi>, timeout: Duration) -> Self {
        Self {
            api,
            timeout,
            state: Arc::new(RwLock::new(GatewayState::default())),
        }
    }

    pub async fn infer(
        &self,
        snapshot: &SignalSnapshot,
        fingerprint: &Fingerprint,
        journey_day: u32,
    ) -> InferenceResult {
        {
            let mut state = self.state.write().await;
            state.in_flight += 1;
            state.phase = GatewayPhase::Requesting;
        }

        let request = InferenceRequest {
            signals: snapshot.clone(),
            fingerprint_id: fingerprint.master_id.clone(),
            journey_day,
        };

        let started = Instant::now();
        let response = match timeout(self.timeout, self.api.decide(&request)).await {
            Ok(response) => response,
            Err(_) => Err(ApiError::Timeout(self.timeout)),
        };

        let (result, outcome) = match response {
            Ok(decision) => {
                let result = InferenceResult::from_remote(decision, journey_day);
                log_info!(
                    "remote decision '{}' ({} mode, {} suggestions) in {:?}",
                    result.matched_scenario,
                    result.mode.as_str(),
                    result.suggestions.len(),
                    started.elapsed()
                );
                (result, Outcome::Success)
            }
            Err(err) => {
                let kind = err.kind();
                log_warn!("inference failed open after {:?}: {err}", started.elapsed());
                (
                    synthesize(snapshot, journey_day, kind),
                    Outcome::FailedOpen(kind),
                )
            }
        };

        let mut state = self.state.write().await;
        state.in_flight = state.in_flight.saturating_sub(1);
        if state.in_flight == 0 {
            state.phase = GatewayPhase::Idle;
        }
        state.last_outcome = Some(outcome);

        result
    }

    pub async fn phase(&self) -> GatewayPhase {
        self.state.read().await.phase
    }

    pub async fn last_outcome(&self) -> Option<Outcome> {
        self.state.read().await.last_outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{decision_with, ScriptedApi};
    use crate::fingerprint::deriver::tests::snapshot_at;
    use crate::fingerprint::derive_fingerprint;
    use crate::inference::fallback::{FAIL_OPEN_CONFIDENCE, FAIL_OPEN_SCENARIO};
    use crate::inference::InferenceSource;
    use chrono::Utc;

    fn gateway(api: ScriptedApi, budget: Duration) -> (InferenceGateway, Arc<ScriptedApi>) {
        let api = Arc::new(api);
        (InferenceGateway::new(api.clone(), budget), api)
    }

    fn assert_complete_fail_open(result: &InferenceResult, reason: FailureKind) {
        assert_eq!(result.source, InferenceSource::FailOpen { reason });
        assert_eq!(result.confidence, FAIL_OPEN_CONFIDENCE);
        assert!(!result.greeting.is_empty());
        assert!(!result.reasoning.is_empty());
        assert!(!result.suggestions.is_empty());
        assert_eq!(result.matched_scenario, FAIL_OPEN_SCENARIO);
    }

    #[tokio::test]
    async fn remote_success_is_passed_through() {
        let snapshot = snapshot_at(9, 3);
        let fingerprint = derive_fingerprint(&snapshot, Utc::now());
        let (gateway, api) = gateway(
            ScriptedApi::new().with_decision(decision_with("commute_morning", &["a", "b"])),
            Duration::from_secs(2),
        );

        let result = gateway.infer(&snapshot, &fingerprint, 5).await;

        assert_eq!(result.source, InferenceSource::Remote);
        assert_eq!(result.suggestions.len(), 2);
        assert_eq!(gateway.last_outcome().await, Some(Outcome::Success));
        assert_eq!(gateway.phase().await, GatewayPhase::Idle);
        assert_eq!(result.matched_scenario, "commute_morning");

        let sent = api.requests();
        assert_eq!(sent[0].fingerprint_id, fingerprint.master_id);
        assert_eq!(sent[0].journey_day, 5);
    }

    #[tokio::test]
    async fn timeout_fails_open_within_budget() {
        let snapshot = snapshot_at(9, 3);
        let fingerprint = derive_fingerprint(&snapshot, Utc::now());
        let (gateway, _) = gateway(ScriptedApi::new().hanging(), Duration::from_millis(50));

        let started = Instant::now();
        let result = gateway.infer(&snapshot, &fingerprint, 1).await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_complete_fail_open(&result, FailureKind::Timeout);
        assert_eq!(
            gateway.last_outcome().await,
            Some(Outcome::FailedOpen(FailureKind::Timeout))
        );
    }

    #[tokio::test]
    async fn network_error_fails_open() {
        let snapshot = snapshot_at(14, 3);
        let fingerprint = derive_fingerprint(&snapshot, Utc::now());
        let (gateway, _) = gateway(
            ScriptedApi::new().with_error(ApiError::Network("connection refused".into())),
            Duration::from_secs(2),
        );

        let result = gateway.infer(&snapshot, &fingerprint, 1).await;
        assert_complete_fail_open(&result, FailureKind::Network);
    }

    #[tokio::test]
    async fn server_error_fails_open() {
        let snapshot = snapshot_at(19, 3);
        let fingerprint = derive_fingerprint(&snapshot, Utc::now());
        let (gateway, _) = gateway(
            ScriptedApi::new().with_error(ApiError::Server {
                status: 500,
                body: "internal".into(),
            }),
            Duration::from_secs(2),
        );

        let result = gateway.infer(&snapshot, &fingerprint, 1).await;
        assert_complete_fail_open(&result, FailureKind::Server);
        assert_eq!(
            gateway.last_outcome().await,
            Some(Outcome::FailedOpen(FailureKind::Server))
        );
    }
}
