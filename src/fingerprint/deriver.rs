use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::db::Database;
use crate::signals::{DeviceSignals, SignalSnapshot};

use super::hash::{combine, stable_hash};
use super::insights::DerivedInsights;
use super::types::{
    BehavioralComponent, Fingerprint, FingerprintComponents, HardwareComponent,
    SoftwareComponent, FINGERPRINT_VERSION,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const CONFIDENCE_BASE: f64 = 0.5;
const CONFIDENCE_STABILITY_SPAN: f64 = 0.3;
const CONFIDENCE_BONUS: f64 = 0.15;
const CONFIDENCE_CAP: f64 = 0.95;

const UNAVAILABLE: &str = "unknown";

/// Derives the install's identity once and keeps it fresh on later launches.
#[derive(Clone)]
pub struct FingerprintDeriver {
    db: Database,
}

impl FingerprintDeriver {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Load the persisted fingerprint and bump its session counter, or derive
    /// a new one. `force_refresh` recomputes hashes from `snapshot` while
    /// keeping the original creation time and counters.
    pub async fn derive_or_update(
        &self,
        snapshot: &SignalSnapshot,
        force_refresh: bool,
    ) -> Fingerprint {
        let now = Utc::now();
        let existing = match self.db.load_fingerprint().await {
            Ok(found) => found,
            Err(err) => {
                log_warn!("fingerprint load failed, deriving in memory: {err:#}");
                None
            }
        };

        let fingerprint = match existing {
            Some(mut stored) if !force_refresh && stored.version == FINGERPRINT_VERSION => {
                stored.session_count = stored.session_count.saturating_add(1);
                stored.updated_at = now;
                stored
            }
            Some(stored) => {
                let mut fresh = derive_fingerprint(snapshot, now);
                fresh.created_at = stored.created_at;
                fresh.session_count = stored.session_count.saturating_add(1);
                fresh.insights.lifestyle = stored.insights.lifestyle;
                fresh.insights.urbanity = stored.insights.urbanity;
                fresh.insights.merge_answers(&snapshot.questionnaire.answers);
                if fresh.master_id != stored.master_id {
                    log_info!(
                        "fingerprint id changed on refresh: {} -> {}",
                        stored.master_id,
                        fresh.master_id
                    );
                }
                fresh
            }
            None => {
                let fresh = derive_fingerprint(snapshot, now);
                log_info!(
                    "derived new fingerprint {} (confidence {:.2})",
                    fresh.master_id,
                    fresh.confidence
                );
                fresh
            }
        };

        if let Err(err) = self.db.save_fingerprint(&fingerprint).await {
            log_warn!("fingerprint persist failed, continuing in memory: {err:#}");
        }

        fingerprint
    }

    /// Fold questionnaire answers into the stored labels. Ids and hashes are
    /// left untouched. Returns the updated fingerprint when one exists.
    pub async fn merge_questionnaire(
        &self,
        answers: &BTreeMap<String, String>,
    ) -> Option<Fingerprint> {
        let mut stored = match self.db.load_fingerprint().await {
            Ok(Some(stored)) => stored,
            Ok(None) => return None,
            Err(err) => {
                log_warn!("fingerprint load failed during questionnaire merge: {err:#}");
                return None;
            }
        };

        if stored.insights.merge_answers(answers) {
            stored.updated_at = Utc::now();
            if let Err(err) = self.db.save_fingerprint(&stored).await {
                log_warn!("fingerprint persist failed after questionnaire merge: {err:#}");
            }
        }

        Some(stored)
    }
}

/// Pure derivation. The master id depends only on hardware, screen, OS and
/// locale signals.
pub fn derive_fingerprint(snapshot: &SignalSnapshot, now: DateTime<Utc>) -> Fingerprint {
    let device = &snapshot.device;
    let context = &snapshot.context;

    let memory = device
        .total_memory_bytes
        .map(|bytes| bytes.to_string());
    let device_hash = stable_hash([
        device.brand.as_deref().unwrap_or(UNAVAILABLE),
        device.model.as_deref().unwrap_or(UNAVAILABLE),
        memory.as_deref().unwrap_or(UNAVAILABLE),
    ]);
    let screen_hash = stable_hash([
        format!("{:.1}", device.screen_width),
        format!("{:.1}", device.screen_height),
        format!("{:.2}", device.pixel_ratio),
        format!("{:.2}", device.font_scale),
    ]);
    let os_hash = stable_hash([device.os_name.as_str(), device.os_version.as_str()]);
    let locale_hash = stable_hash([
        context.language_tag.as_str(),
        context.timezone.as_str(),
        context.region.as_deref().unwrap_or(UNAVAILABLE),
    ]);

    let session_count = snapshot.app.session_count.max(1);
    let bucket = session_bucket(session_count);
    let preferred_time = context.time_of_day.as_str();
    let behavioral_hash = stable_hash([bucket, preferred_time]);

    let master_id = format!(
        "fp_{}",
        stable_hash([
            device_hash.as_str(),
            screen_hash.as_str(),
            os_hash.as_str(),
            locale_hash.as_str(),
        ])
    );

    Fingerprint {
        master_id,
        version: FINGERPRINT_VERSION,
        confidence: confidence(device),
        components: FingerprintComponents {
            hardware: HardwareComponent {
                combined: combine(&device_hash, &screen_hash),
                device: device_hash,
                screen: screen_hash,
            },
            software: SoftwareComponent {
                combined: combine(&os_hash, &locale_hash),
                os: os_hash,
                locale: locale_hash,
            },
            behavioral: BehavioralComponent {
                session_bucket: bucket.to_string(),
                preferred_time: preferred_time.to_string(),
                hash: behavioral_hash,
            },
        },
        insights: DerivedInsights::derive(snapshot),
        session_count,
        created_at: now,
        updated_at: now,
        transparency: transparency_report(snapshot, bucket),
    }
}

/// Share of the hardware signal set that was readable, weighted toward the
/// fields that actually discriminate devices.
fn stability_weight(device: &DeviceSignals) -> f64 {
    let mut weight = 0.0;
    if device.brand.is_some() {
        weight += 0.2;
    }
    if device.model.is_some() {
        weight += 0.4;
    }
    if device.total_memory_bytes.is_some() {
        weight += 0.4;
    }
    weight
}

pub fn confidence(device: &DeviceSignals) -> f64 {
    let raw = CONFIDENCE_BASE
        + stability_weight(device) * CONFIDENCE_STABILITY_SPAN
        + CONFIDENCE_BONUS;
    raw.clamp(0.0, CONFIDENCE_CAP)
}

fn session_bucket(session_count: u32) -> &'static str {
    match session_count {
        0..=1 => "first",
        2..=5 => "casual",
        6..=20 => "regular",
        _ => "power",
    }
}

fn transparency_report(snapshot: &SignalSnapshot, session_bucket: &str) -> Vec<String> {
    let device = &snapshot.device;
    let mark = |label: &str, present: bool| {
        if present {
            label.to_string()
        } else {
            format!("{label} (unavailable)")
        }
    };

    vec![
        format!(
            "Hardware: {}, {}, {}",
            mark("device brand", device.brand.is_some()),
            mark("device model", device.model.is_some()),
            mark("total memory", device.total_memory_bytes.is_some()),
        ),
        "Screen: width, height, pixel density, font scale".to_string(),
        "Software: OS name, OS version".to_string(),
        format!(
            "Locale: language, timezone, {}",
            mark("region", snapshot.context.region.is_some())
        ),
        format!(
            "Behavior (not part of your id): usage level '{}', active time '{}'",
            session_bucket,
            snapshot.context.time_of_day.as_str()
        ),
        "Never used: name, phone number, contacts, precise location".to_string(),
    ]
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::signals::{
        ActivitySignals, AppUsageSignals, BatterySignals, EnvironmentSignals, LocaleInfo,
        LocationSignals, NetworkSignals, QuestionnaireSignals, SocialSignals, TimeContext,
    };
    use chrono::{Duration, NaiveDate};

    pub(crate) fn snapshot_at(hour: u32, session_count: u32) -> SignalSnapshot {
        let local = NaiveDate::from_ymd_opt(2024, 3, 13)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        SignalSnapshot {
            captured_at: Utc::now(),
            device: DeviceSignals {
                brand: Some("Samsung".into()),
                model: Some("Galaxy M31".into()),
                os_name: "Android".into(),
                os_version: "12".into(),
                total_memory_bytes: Some(6 * 1024 * 1024 * 1024),
                screen_width: 1080.0,
                screen_height: 2340.0,
                pixel_ratio: 2.75,
                font_scale: 1.0,
                ..DeviceSignals::default()
            },
            network: NetworkSignals::default(),
            battery: BatterySignals::default(),
            context: TimeContext::derive(
                local,
                &LocaleInfo {
                    language_tag: "en-IN".into(),
                    timezone: "Asia/Kolkata".into(),
                    region: Some("IN".into()),
                },
            ),
            environment: EnvironmentSignals::default(),
            app: AppUsageSignals {
                session_count,
                ..AppUsageSignals::default()
            },
            location: LocationSignals::default(),
            activity: ActivitySignals::default(),
            social: SocialSignals::default(),
            questionnaire: QuestionnaireSignals::default(),
        }
    }

    #[test]
    fn master_id_ignores_sessions_and_time() {
        let now = Utc::now();
        let first = derive_fingerprint(&snapshot_at(7, 1), now);
        let later = derive_fingerprint(&snapshot_at(22, 57), now + Duration::days(40));

        assert_eq!(first.master_id, later.master_id);
        assert_eq!(first.components.hardware, later.components.hardware);
        assert_eq!(first.components.software, later.components.software);
        assert_ne!(first.components.behavioral.hash, later.components.behavioral.hash);
    }

    #[test]
    fn master_id_tracks_stable_signals() {
        let now = Utc::now();
        let base = derive_fingerprint(&snapshot_at(7, 1), now);

        let mut upgraded = snapshot_at(7, 1);
        upgraded.device.os_version = "13".into();
        assert_ne!(derive_fingerprint(&upgraded, now).master_id, base.master_id);

        let mut relocated = snapshot_at(7, 1);
        relocated.context.timezone = "Asia/Dubai".into();
        assert_ne!(derive_fingerprint(&relocated, now).master_id, base.master_id);
    }

    #[test]
    fn confidence_reflects_hardware_availability() {
        let full = snapshot_at(7, 1);
        assert!((confidence(&full.device) - 0.95).abs() < 1e-9);

        let mut sparse = full.device.clone();
        sparse.model = None;
        sparse.total_memory_bytes = None;
        let sparse_conf = confidence(&sparse);
        assert!(sparse_conf < 0.95);
        assert!((sparse_conf - 0.71).abs() < 1e-9);

        let bare = DeviceSignals::default();
        let bare_conf = confidence(&bare);
        assert!((0.0..=0.95).contains(&bare_conf));
        assert!((bare_conf - 0.65).abs() < 1e-9);
    }

    #[test]
    fn transparency_marks_missing_signals() {
        let mut snapshot = snapshot_at(7, 1);
        snapshot.device.model = None;
        let fingerprint = derive_fingerprint(&snapshot, Utc::now());
        assert!(fingerprint.transparency[0].contains("device model (unavailable)"));
        assert!(fingerprint
            .transparency
            .iter()
            .any(|line| line.contains("not part of your id")));
    }

    #[tokio::test]
    async fn repeat_derivation_only_bumps_counter_and_timestamp() {
        let tmp = tempfile::tempdir().unwrap();
        let db = Database::new(tmp.path().join("engine.sqlite3")).unwrap();
        let deriver = FingerprintDeriver::new(db.clone());

        let first = deriver.derive_or_update(&snapshot_at(7, 1), false).await;

        let mut drifted = snapshot_at(21, 30);
        drifted.device.os_version = "14".into();
        let second = deriver.derive_or_update(&drifted, false).await;

        assert_eq!(second.master_id, first.master_id);
        assert_eq!(second.components, first.components);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.session_count, first.session_count + 1);
        assert!(second.updated_at >= first.updated_at);

        let stored = db.load_fingerprint().await.unwrap().unwrap();
        assert_eq!(stored.master_id, second.master_id);
        assert_eq!(stored.session_count, second.session_count);
        assert_eq!(stored.updated_at, second.updated_at);
    }

    #[tokio::test]
    async fn forced_refresh_recomputes_but_keeps_history() {
        let tmp = tempfile::tempdir().unwrap();
        let db = Database::new(tmp.path().join("engine.sqlite3")).unwrap();
        let deriver = FingerprintDeriver::new(db);

        let first = deriver.derive_or_update(&snapshot_at(7, 1), false).await;
        let answers = BTreeMap::from([("lifestyle".to_string(), "retired".to_string())]);
        deriver.merge_questionnaire(&answers).await.unwrap();

        let mut upgraded = snapshot_at(7, 4);
        upgraded.device.os_version = "14".into();
        let refreshed = deriver.derive_or_update(&upgraded, true).await;

        assert_ne!(refreshed.master_id, first.master_id);
        assert_eq!(refreshed.created_at, first.created_at);
        assert_eq!(refreshed.session_count, 2);
        assert_eq!(
            refreshed.insights.lifestyle,
            crate::fingerprint::Lifestyle::Retired
        );
    }

    #[test]
    fn journey_day_starts_at_one() {
        let now = Utc::now();
        let fingerprint = derive_fingerprint(&snapshot_at(7, 1), now);
        assert_eq!(fingerprint.journey_day(now), 1);
        assert_eq!(fingerprint.journey_day(now + Duration::hours(30)), 2);
        assert_eq!(fingerprint.journey_day(now + Duration::days(9)), 10);
    }
}
