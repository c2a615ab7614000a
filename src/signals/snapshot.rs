//! Signal snapshot data model.
//!
//! One immutable capture of device, environment and usage telemetry. Every
//! group has a `Default` that doubles as the documented fallback when its
//! probe cannot read the underlying capability.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::time_context::TimeContext;

const GIB: u64 = 1024 * 1024 * 1024;
const LOW_END_MEMORY_BYTES: u64 = 3 * GIB;
const HIGH_END_MEMORY_BYTES: u64 = 6 * GIB;
const LOW_BATTERY_LEVEL: f64 = 0.20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalSnapshot {
    pub captured_at: DateTime<Utc>,
    pub device: DeviceSignals,
    pub network: NetworkSignals,
    pub battery: BatterySignals,
    pub context: TimeContext,
    pub environment: EnvironmentSignals,
    pub app: AppUsageSignals,
    pub location: LocationSignals,
    pub activity: ActivitySignals,
    pub social: SocialSignals,
    pub questionnaire: QuestionnaireSignals,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    LowEnd,
    MidRange,
    HighEnd,
    Unknown,
}

impl DeviceClass {
    pub fn from_memory(total_memory_bytes: Option<u64>) -> Self {
        match total_memory_bytes {
            None | Some(0) => DeviceClass::Unknown,
            Some(bytes) if bytes < LOW_END_MEMORY_BYTES => DeviceClass::LowEnd,
            Some(bytes) if bytes < HIGH_END_MEMORY_BYTES => DeviceClass::MidRange,
            Some(_) => DeviceClass::HighEnd,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::LowEnd => "low_end",
            DeviceClass::MidRange => "mid_range",
            DeviceClass::HighEnd => "high_end",
            DeviceClass::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AccessibilitySignals {
    pub screen_reader: bool,
    pub reduce_motion: bool,
    pub bold_text: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceSignals {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub os_name: String,
    pub os_version: String,
    pub total_memory_bytes: Option<u64>,
    pub device_class: DeviceClass,
    pub is_tablet: bool,
    pub screen_width: f64,
    pub screen_height: f64,
    pub pixel_ratio: f64,
    pub font_scale: f64,
    pub accessibility: AccessibilitySignals,
}

impl Default for DeviceSignals {
    fn default() -> Self {
        Self {
            brand: None,
            model: None,
            os_name: "unknown".into(),
            os_version: "unknown".into(),
            total_memory_bytes: None,
            device_class: DeviceClass::Unknown,
            is_tablet: false,
            screen_width: 0.0,
            screen_height: 0.0,
            pixel_ratio: 1.0,
            font_scale: 1.0,
            accessibility: AccessibilitySignals::default(),
        }
    }
}

impl DeviceSignals {
    pub fn memory_gib(&self) -> Option<f64> {
        self.total_memory_bytes.map(|bytes| bytes as f64 / GIB as f64)
    }

    pub fn is_low_end(&self) -> bool {
        self.device_class == DeviceClass::LowEnd
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkType {
    Wifi,
    Cellular,
    Ethernet,
    None,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkSignals {
    pub network_type: NetworkType,
    pub is_connected: bool,
    pub is_metered: bool,
    pub carrier: Option<String>,
    pub cellular_generation: Option<String>,
}

impl Default for NetworkSignals {
    fn default() -> Self {
        Self {
            network_type: NetworkType::Unknown,
            is_connected: false,
            is_metered: false,
            carrier: None,
            cellular_generation: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatterySignals {
    pub level: f64,
    pub is_charging: bool,
    pub low_power_mode: bool,
}

impl Default for BatterySignals {
    fn default() -> Self {
        Self {
            level: 1.0,
            is_charging: false,
            low_power_mode: false,
        }
    }
}

impl BatterySignals {
    /// OS power saver is on, or the battery is draining below 20%.
    pub fn is_low_power(&self) -> bool {
        self.low_power_mode || (!self.is_charging && self.level < LOW_BATTERY_LEVEL)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentSignals {
    pub brightness: f64,
    pub volume: f64,
    pub headphones_connected: bool,
}

impl Default for EnvironmentSignals {
    fn default() -> Self {
        Self {
            brightness: 0.5,
            volume: 0.5,
            headphones_connected: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppUsageSignals {
    pub first_seen_at: Option<DateTime<Utc>>,
    pub days_since_install: u32,
    pub session_count: u32,
    pub total_time_ms: u64,
    pub is_first_session: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LocationSignals {
    pub has_permission: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Stationary,
    Walking,
    Running,
    Cycling,
    Driving,
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActivitySignals {
    pub has_permission: bool,
    pub activity: Option<ActivityKind>,
    pub steps_today: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SocialSignals {
    pub has_contacts_permission: bool,
    pub contact_count: Option<u32>,
    pub has_calendar_permission: bool,
    pub upcoming_events: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QuestionnaireSignals {
    pub completed: bool,
    pub answers: BTreeMap<String, String>,
}
