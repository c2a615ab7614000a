use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::insights::DerivedInsights;

pub const FINGERPRINT_VERSION: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HardwareComponent {
    pub device: String,
    pub screen: String,
    pub combined: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SoftwareComponent {
    pub os: String,
    pub locale: String,
    pub combined: String,
}

/// Drifts as the user's habits change, so it never feeds the master id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BehavioralComponent {
    pub session_bucket: String,
    pub preferred_time: String,
    pub hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FingerprintComponents {
    pub hardware: HardwareComponent,
    pub software: SoftwareComponent,
    pub behavioral: BehavioralComponent,
}

/// Anonymous per-install identity standing in for a login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fingerprint {
    pub master_id: String,
    pub version: u32,
    pub confidence: f64,
    pub components: FingerprintComponents,
    pub insights: DerivedInsights,
    pub session_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Which signals fed each hash, for display to the user.
    pub transparency: Vec<String>,
}

impl Fingerprint {
    /// Day 1 is the day the identity was first derived.
    pub fn journey_day(&self, now: DateTime<Utc>) -> u32 {
        let elapsed = (now - self.created_at).num_days().max(0);
        u32::try_from(elapsed).unwrap_or(u32::MAX - 1) + 1
    }
}
