use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

const ENV_API_URL: &str = "BHARAT_API_URL";
const ENV_INFERENCE_TIMEOUT_MS: &str = "BHARAT_INFERENCE_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub api_base_url: String,
    pub inference_timeout_ms: u64,
    pub feedback_timeout_ms: u64,
    pub probe_timeout_ms: u64,
    /// Prefetch fires once the feed holds this many cards or fewer.
    pub low_watermark: usize,
    /// Consecutive zero-yield prefetches before the feed reports exhaustion.
    pub max_empty_prefetches: u32,
    pub session_history_cap: usize,
    pub event_batch_size: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".into(),
            inference_timeout_ms: 12_000,
            feedback_timeout_ms: 5_000,
            probe_timeout_ms: 750,
            low_watermark: 1,
            max_empty_prefetches: 3,
            session_history_cap: 50,
            event_batch_size: 20,
        }
    }
}

impl EngineSettings {
    pub fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.inference_timeout_ms)
    }

    pub fn feedback_timeout(&self) -> Duration {
        Duration::from_millis(self.feedback_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                self.api_base_url = url.trim().trim_end_matches('/').to_string();
            }
        }

        if let Some(ms) = std::env::var(ENV_INFERENCE_TIMEOUT_MS)
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
        {
            self.inference_timeout_ms = ms;
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<EngineSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let mut data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!(
                    "Ignoring unreadable settings at {}: {err}",
                    path.display()
                );
                EngineSettings::default()
            })
        } else {
            EngineSettings::default()
        };
        data.apply_env_overrides();

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn current(&self) -> EngineSettings {
        self.read().clone()
    }

    pub fn update(&self, settings: EngineSettings) -> Result<()> {
        let mut guard = self.write();
        *guard = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &EngineSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, EngineSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, EngineSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(tmp.path().join("settings.json")).unwrap();
        let settings = store.current();
        assert_eq!(settings.low_watermark, 1);
        assert_eq!(settings.inference_timeout_ms, 12_000);
    }

    #[test]
    fn update_round_trips_through_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.current();
        settings.low_watermark = 3;
        settings.event_batch_size = 5;
        store.update(settings).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.current().low_watermark, 3);
        assert_eq!(reopened.current().event_batch_size, 5);
    }

    #[test]
    fn partial_and_garbage_files_fall_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let partial = tmp.path().join("partial.json");
        fs::write(&partial, r#"{ "low_watermark": 2 }"#).unwrap();
        let store = SettingsStore::new(partial).unwrap();
        assert_eq!(store.current().low_watermark, 2);
        assert_eq!(store.current().feedback_timeout_ms, 5_000);

        let garbage = tmp.path().join("garbage.json");
        fs::write(&garbage, "not json").unwrap();
        let store = SettingsStore::new(garbage).unwrap();
        assert_eq!(store.current().low_watermark, 1);
    }
}
