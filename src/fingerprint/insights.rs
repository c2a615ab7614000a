//! Coarse labels bucketed from device signals.
//!
//! These are heuristics, not inference: memory tiers stand in for income,
//! font magnification and session counts for tech-savviness. Lifestyle and
//! urbanity are never guessed; they stay `Unknown` until the user answers
//! the questionnaire.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::signals::SignalSnapshot;

const GIB: u64 = 1024 * 1024 * 1024;

pub const LIFESTYLE_QUESTION: &str = "lifestyle";
pub const URBANITY_QUESTION: &str = "area";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IncomeEstimate {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TechSavviness {
    Beginner,
    Intermediate,
    Advanced,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Lifestyle {
    Student,
    Professional,
    Homemaker,
    BusinessOwner,
    Retired,
    #[default]
    Unknown,
}

impl Lifestyle {
    pub fn parse(answer: &str) -> Option<Self> {
        match answer.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Lifestyle::Student),
            "professional" => Some(Lifestyle::Professional),
            "homemaker" => Some(Lifestyle::Homemaker),
            "business_owner" => Some(Lifestyle::BusinessOwner),
            "retired" => Some(Lifestyle::Retired),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Urbanity {
    Metro,
    Urban,
    SemiUrban,
    Rural,
    #[default]
    Unknown,
}

impl Urbanity {
    pub fn parse(answer: &str) -> Option<Self> {
        match answer.trim().to_ascii_lowercase().as_str() {
            "metro" => Some(Urbanity::Metro),
            "urban" => Some(Urbanity::Urban),
            "semi_urban" => Some(Urbanity::SemiUrban),
            "rural" => Some(Urbanity::Rural),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DerivedInsights {
    pub income: IncomeEstimate,
    pub tech_savviness: TechSavviness,
    pub lifestyle: Lifestyle,
    pub urbanity: Urbanity,
}

impl DerivedInsights {
    pub fn derive(snapshot: &SignalSnapshot) -> Self {
        let mut insights = Self {
            income: estimate_income(snapshot.device.total_memory_bytes),
            tech_savviness: estimate_tech_savviness(
                snapshot.device.font_scale,
                snapshot.app.session_count,
            ),
            lifestyle: Lifestyle::Unknown,
            urbanity: Urbanity::Unknown,
        };
        insights.merge_answers(&snapshot.questionnaire.answers);
        insights
    }

    /// Apply explicit answers. Unrecognized answers leave the label as is.
    /// Returns true when a label changed.
    pub fn merge_answers(&mut self, answers: &BTreeMap<String, String>) -> bool {
        let before = self.clone();
        if let Some(lifestyle) = answers.get(LIFESTYLE_QUESTION).and_then(|a| Lifestyle::parse(a)) {
            self.lifestyle = lifestyle;
        }
        if let Some(urbanity) = answers.get(URBANITY_QUESTION).and_then(|a| Urbanity::parse(a)) {
            self.urbanity = urbanity;
        }
        *self != before
    }
}

pub fn estimate_income(total_memory_bytes: Option<u64>) -> IncomeEstimate {
    match total_memory_bytes {
        Some(bytes) if bytes >= 8 * GIB => IncomeEstimate::High,
        Some(bytes) if bytes >= 4 * GIB => IncomeEstimate::Medium,
        Some(bytes) if bytes > 0 => IncomeEstimate::Low,
        _ => IncomeEstimate::Unknown,
    }
}

pub fn estimate_tech_savviness(font_scale: f64, session_count: u32) -> TechSavviness {
    if font_scale > 1.3 || session_count < 3 {
        TechSavviness::Beginner
    } else if session_count > 20 {
        TechSavviness::Advanced
    } else {
        TechSavviness::Intermediate
    }
}
