use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    /// Morning 5-11, afternoon 12-16, evening 17-20, night otherwise.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=20 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocaleInfo {
    pub language_tag: String,
    pub timezone: String,
    pub region: Option<String>,
}

impl Default for LocaleInfo {
    fn default() -> Self {
        Self {
            language_tag: "en-US".into(),
            timezone: "UTC".into(),
            region: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeContext {
    pub hour: u32,
    pub weekday: String,
    pub time_of_day: TimeOfDay,
    pub is_morning: bool,
    pub is_afternoon: bool,
    pub is_evening: bool,
    pub is_night: bool,
    pub is_weekend: bool,
    pub language_tag: String,
    pub timezone: String,
    pub region: Option<String>,
}

impl TimeContext {
    /// Pure derivation from a local wall-clock reading.
    pub fn derive(local: NaiveDateTime, locale: &LocaleInfo) -> Self {
        let hour = local.hour();
        let weekday = local.weekday();
        let time_of_day = TimeOfDay::from_hour(hour);

        Self {
            hour,
            weekday: weekday.to_string(),
            time_of_day,
            is_morning: time_of_day == TimeOfDay::Morning,
            is_afternoon: time_of_day == TimeOfDay::Afternoon,
            is_evening: time_of_day == TimeOfDay::Evening,
            is_night: time_of_day == TimeOfDay::Night,
            is_weekend: matches!(weekday, Weekday::Sat | Weekday::Sun),
            language_tag: locale.language_tag.clone(),
            timezone: locale.timezone.clone(),
            region: locale.region.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn seven_am_is_morning_only() {
        // 2024-03-13 is a Wednesday.
        let ctx = TimeContext::derive(at(2024, 3, 13, 7), &LocaleInfo::default());
        assert_eq!(ctx.time_of_day, TimeOfDay::Morning);
        assert!(ctx.is_morning);
        assert!(!ctx.is_afternoon);
        assert!(!ctx.is_evening);
        assert!(!ctx.is_night);
        assert!(!ctx.is_weekend);
        assert_eq!(ctx.weekday, "Wed");
    }

    #[test]
    fn period_boundaries_are_inclusive() {
        let expected = [
            (4, TimeOfDay::Night),
            (5, TimeOfDay::Morning),
            (11, TimeOfDay::Morning),
            (12, TimeOfDay::Afternoon),
            (16, TimeOfDay::Afternoon),
            (17, TimeOfDay::Evening),
            (20, TimeOfDay::Evening),
            (21, TimeOfDay::Night),
            (0, TimeOfDay::Night),
        ];
        for (hour, period) in expected {
            assert_eq!(TimeOfDay::from_hour(hour), period, "hour {hour}");
        }
    }

    #[test]
    fn saturday_and_sunday_are_weekend() {
        // 2024-03-16 Saturday, 2024-03-17 Sunday, 2024-03-18 Monday.
        let locale = LocaleInfo::default();
        assert!(TimeContext::derive(at(2024, 3, 16, 10), &locale).is_weekend);
        assert!(TimeContext::derive(at(2024, 3, 17, 22), &locale).is_weekend);
        assert!(!TimeContext::derive(at(2024, 3, 18, 10), &locale).is_weekend);
    }
}
