//! Local stand-in for the remote decision, built from the snapshot alone.

use crate::signals::{NetworkType, SignalSnapshot, TimeOfDay};

use super::types::{
    FailureKind, InferenceResult, InferenceSource, Journey, Persona, Suggestion,
    SuggestionContent, UiMode,
};

pub const FAIL_OPEN_CONFIDENCE: f64 = 0.5;
pub const FAIL_OPEN_SCENARIO: &str = "offline_fallback";

const RICH_BATTERY_LEVEL: f64 = 0.5;
const OFFLINE_SUFFIX: &str = " (offline mode)";
const OFFLINE_HELP_URL: &str = "https://bharat.app/offline";

pub fn fail_open_mode(snapshot: &SignalSnapshot) -> UiMode {
    if snapshot.device.is_low_end() || snapshot.battery.is_low_power() {
        UiMode::Lite
    } else if snapshot.network.network_type == NetworkType::Wifi
        && snapshot.battery.level > RICH_BATTERY_LEVEL
    {
        UiMode::Rich
    } else {
        UiMode::Standard
    }
}

fn greeting_for(time_of_day: TimeOfDay) -> &'static str {
    match time_of_day {
        TimeOfDay::Morning => "Good morning",
        TimeOfDay::Afternoon => "Good afternoon",
        TimeOfDay::Evening => "Good evening",
        TimeOfDay::Night => "Hello, night owl",
    }
}

/// Build a complete result without the network. Always carries the offline
/// marker in its greeting and reasoning, and the fixed low confidence.
pub fn synthesize(
    snapshot: &SignalSnapshot,
    journey_day: u32,
    reason: FailureKind,
) -> InferenceResult {
    let mode = fail_open_mode(snapshot);
    let time_of_day = snapshot.context.time_of_day;

    let mut reasoning = vec![
        format!("Currently offline: {}", reason.describe()),
        format!("Time of day: {}", time_of_day.as_str()),
        format!("Device class: {}", snapshot.device.device_class.as_str()),
    ];
    if snapshot.battery.is_low_power() {
        reasoning.push(format!(
            "Battery saver: {:.0}% remaining",
            snapshot.battery.level * 100.0
        ));
    }
    reasoning.push(format!("Layout: {}", mode.as_str()));

    InferenceResult {
        source: InferenceSource::FailOpen { reason },
        mode,
        persona: Persona {
            id: "offline".into(),
            label: "Offline companion".into(),
            description: "Basic experience while the service is unreachable".into(),
        },
        greeting: format!("{}{}", greeting_for(time_of_day), OFFLINE_SUFFIX),
        message: "Personalized picks will return once you're back online.".into(),
        suggestions: canned_suggestions(),
        journey: Journey::for_day(journey_day),
        reasoning,
        matched_scenario: FAIL_OPEN_SCENARIO.into(),
        confidence: FAIL_OPEN_CONFIDENCE,
        intelligence_summary: None,
    }
}

fn canned_suggestions() -> Vec<Suggestion> {
    let local = |id: &str, title: &str, description: &str, icon: &str, priority: u8| Suggestion {
        id: Some(id.into()),
        action: Some(id.into()),
        title: title.into(),
        description: description.into(),
        icon: icon.into(),
        priority,
        content: Some(SuggestionContent {
            deep_link: Some(format!("bharat://{id}")),
            fallback_url: Some(format!("{OFFLINE_HELP_URL}/{id}")),
            source: Some("local".into()),
            category: Some("offline".into()),
            content_type: Some("utility".into()),
        }),
    };

    vec![
        local(
            "retry-connection",
            "Try again",
            "Reconnect to get suggestions picked for you",
            "refresh",
            1,
        ),
        local(
            "cached-content",
            "Saved for later",
            "Browse what you opened recently",
            "archive",
            2,
        ),
        local(
            "offline-features",
            "Works offline",
            "Tools you can use without a connection",
            "wifi-off",
            3,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::cards_from;
    use crate::fingerprint::deriver::tests::snapshot_at;
    use crate::signals::{BatterySignals, DeviceClass};

    const GIB: u64 = 1024 * 1024 * 1024;

    fn phone(memory_gib: u64, level: f64, network: NetworkType) -> SignalSnapshot {
        let mut snapshot = snapshot_at(7, 4);
        snapshot.device.total_memory_bytes = Some(memory_gib * GIB);
        snapshot.device.device_class = DeviceClass::from_memory(Some(memory_gib * GIB));
        snapshot.battery = BatterySignals {
            level,
            is_charging: false,
            low_power_mode: false,
        };
        snapshot.network.network_type = network;
        snapshot
    }

    #[test]
    fn low_end_phone_on_low_battery_gets_lite() {
        let snapshot = phone(2, 0.15, NetworkType::Cellular);
        assert_eq!(fail_open_mode(&snapshot), UiMode::Lite);
    }

    #[test]
    fn flagship_on_wifi_gets_rich() {
        let snapshot = phone(8, 0.9, NetworkType::Wifi);
        assert_eq!(fail_open_mode(&snapshot), UiMode::Rich);
    }

    #[test]
    fn mid_range_on_cellular_gets_standard() {
        let snapshot = phone(6, 0.6, NetworkType::Cellular);
        assert_eq!(fail_open_mode(&snapshot), UiMode::Standard);
    }

    #[test]
    fn power_saver_forces_lite_even_on_wifi() {
        let mut snapshot = phone(8, 0.9, NetworkType::Wifi);
        snapshot.battery.low_power_mode = true;
        assert_eq!(fail_open_mode(&snapshot), UiMode::Lite);
    }

    #[test]
    fn synthesized_result_is_complete_and_marked_offline() {
        let snapshot = phone(6, 0.6, NetworkType::Cellular);
        let result = synthesize(&snapshot, 4, FailureKind::Network);

        assert!(result.is_fail_open());
        assert_eq!(result.confidence, FAIL_OPEN_CONFIDENCE);
        assert_eq!(result.greeting, "Good morning (offline mode)");
        assert!(result.reasoning[0].starts_with("Currently offline"));
        assert!(result.reasoning.iter().any(|line| line == "Time of day: morning"));
        assert!(result.reasoning.iter().any(|line| line == "Device class: high_end"));

        let ids: Vec<_> = result
            .suggestions
            .iter()
            .filter_map(|s| s.id.as_deref())
            .collect();
        assert_eq!(ids, ["retry-connection", "cached-content", "offline-features"]);
        assert_eq!(result.journey.day, 4);

        for card in cards_from(&result.suggestions) {
            assert!(card.deep_link.is_some(), "{} has no deep link", card.id);
            assert!(card.fallback_url.is_some(), "{} has no fallback", card.id);
        }
    }
}
