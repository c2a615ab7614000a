use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use tokio::time::{Duration, Instant};

use crate::db::Database;

use super::platform::{Capability, PermissionState, Platform};
use super::snapshot::{
    ActivitySignals, AppUsageSignals, DeviceClass, LocationSignals, QuestionnaireSignals,
    SignalSnapshot, SocialSignals,
};
use super::time_context::TimeContext;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// Fans the platform probes out concurrently and folds them into one
/// snapshot. A probe that errors, panics or overruns its budget contributes
/// its default instead; `collect` itself cannot fail.
#[derive(Clone)]
pub struct SignalCollector {
    platform: Arc<dyn Platform>,
    db: Database,
    probe_timeout: Duration,
}

impl SignalCollector {
    pub fn new(platform: Arc<dyn Platform>, db: Database, probe_timeout: Duration) -> Self {
        Self {
            platform,
            db,
            probe_timeout,
        }
    }

    pub async fn collect(&self) -> SignalSnapshot {
        let started = Instant::now();
        let captured_at = Utc::now();

        let (
            device,
            network,
            battery,
            locale,
            environment,
            location,
            activity,
            contacts,
            calendar,
            app,
            questionnaire,
        ) = tokio::join!(
            self.probe("device", |p| p.device()),
            self.probe("network", |p| p.network()),
            self.probe("battery", |p| p.battery()),
            self.probe("locale", |p| p.locale()),
            self.probe("environment", |p| p.environment()),
            self.probe("location", |p| gated(p, Capability::Location, |p| p.location())),
            self.probe("activity", |p| gated(p, Capability::Motion, |p| p.activity())),
            self.probe("contacts", |p| gated(p, Capability::Contacts, |p| p.contacts())),
            self.probe("calendar", |p| gated(p, Capability::Calendar, |p| p.calendar())),
            self.app_usage(captured_at),
            self.questionnaire(),
        );

        let mut device = device.unwrap_or_default();
        if device.device_class == DeviceClass::Unknown {
            device.device_class = DeviceClass::from_memory(device.total_memory_bytes);
        }

        let locale = locale.unwrap_or_default();
        let context = TimeContext::derive(Local::now().naive_local(), &locale);

        let location = match location.flatten() {
            Some(coords) => LocationSignals {
                has_permission: true,
                latitude: coords.as_ref().map(|c| c.latitude),
                longitude: coords.as_ref().map(|c| c.longitude),
                city: coords.as_ref().and_then(|c| c.city.clone()),
                region: coords.and_then(|c| c.region),
            },
            None => LocationSignals::default(),
        };

        let activity = match activity.flatten() {
            Some(reading) => ActivitySignals {
                has_permission: true,
                activity: reading.as_ref().map(|r| r.activity),
                steps_today: reading.and_then(|r| r.steps_today),
            },
            None => ActivitySignals::default(),
        };

        let contacts = contacts.flatten();
        let calendar = calendar.flatten();
        let social = SocialSignals {
            has_contacts_permission: contacts.is_some(),
            contact_count: contacts.flatten(),
            has_calendar_permission: calendar.is_some(),
            upcoming_events: calendar.flatten(),
        };

        log_debug!(
            "signal snapshot collected in {}ms",
            started.elapsed().as_millis()
        );

        SignalSnapshot {
            captured_at,
            device,
            network: network.unwrap_or_default(),
            battery: battery.unwrap_or_default(),
            context,
            environment: environment.unwrap_or_default(),
            app,
            location,
            activity,
            social,
            questionnaire,
        }
    }

    /// Run one platform read on the blocking pool under the probe budget.
    async fn probe<T, F>(&self, name: &'static str, read: F) -> Option<T>
    where
        F: FnOnce(&dyn Platform) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let platform = Arc::clone(&self.platform);
        let task = tokio::task::spawn_blocking(move || read(platform.as_ref()));

        match tokio::time::timeout(self.probe_timeout, task).await {
            Ok(Ok(Ok(value))) => Some(value),
            Ok(Ok(Err(err))) => {
                log_warn!("{name} probe failed, using default: {err:#}");
                None
            }
            Ok(Err(join_err)) => {
                log_warn!("{name} probe aborted, using default: {join_err}");
                None
            }
            Err(_) => {
                log_warn!(
                    "{name} probe exceeded {}ms, using default",
                    self.probe_timeout.as_millis()
                );
                None
            }
        }
    }

    async fn app_usage(&self, now: DateTime<Utc>) -> AppUsageSignals {
        match self.db.session_history().await {
            Ok(Some(history)) => AppUsageSignals {
                first_seen_at: Some(history.first_seen_at),
                days_since_install: history.days_since_install(now),
                session_count: history.session_count,
                total_time_ms: history.total_time_ms,
                is_first_session: history.session_count <= 1,
            },
            Ok(None) => AppUsageSignals {
                is_first_session: true,
                ..AppUsageSignals::default()
            },
            Err(err) => {
                log_warn!("app usage probe failed, using default: {err:#}");
                AppUsageSignals::default()
            }
        }
    }

    async fn questionnaire(&self) -> QuestionnaireSignals {
        match self.db.questionnaire_answers().await {
            Ok(answers) => QuestionnaireSignals {
                completed: !answers.is_empty(),
                answers: answers
                    .into_iter()
                    .map(|answer| (answer.question_id, answer.answer))
                    .collect(),
            },
            Err(err) => {
                log_warn!("questionnaire probe failed, using default: {err:#}");
                QuestionnaireSignals::default()
            }
        }
    }
}

/// `Ok(None)` when the capability is not granted, `Ok(Some(read))` otherwise.
fn gated<T>(
    platform: &dyn Platform,
    capability: Capability,
    read: impl FnOnce(&dyn Platform) -> anyhow::Result<T>,
) -> anyhow::Result<Option<T>> {
    match platform.permission(capability) {
        PermissionState::Granted => read(platform).map(Some),
        PermissionState::Denied | PermissionState::Unavailable => Ok(None),
    }
}
