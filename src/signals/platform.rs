use anyhow::{anyhow, bail, Result};
use sysinfo::{Networks, System};

use super::snapshot::{
    ActivityKind, BatterySignals, DeviceClass, DeviceSignals, EnvironmentSignals, NetworkSignals,
    NetworkType,
};
use super::time_context::LocaleInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Location,
    Motion,
    Contacts,
    Calendar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub city: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityReading {
    pub activity: ActivityKind,
    pub steps_today: Option<u32>,
}

/// Platform capabilities the collector reads from.
///
/// Reads may fail or panic; the collector substitutes defaults. Gated reads
/// (`location`, `activity`, `contacts`, `calendar`) are only attempted after
/// `permission` reports `Granted`, and `Ok(None)` means "granted but nothing
/// to report".
pub trait Platform: Send + Sync {
    fn device(&self) -> Result<DeviceSignals>;
    fn network(&self) -> Result<NetworkSignals>;
    fn battery(&self) -> Result<BatterySignals>;
    fn locale(&self) -> Result<LocaleInfo>;
    fn environment(&self) -> Result<EnvironmentSignals>;

    fn permission(&self, capability: Capability) -> PermissionState;

    fn location(&self) -> Result<Option<Coordinates>>;
    fn activity(&self) -> Result<Option<ActivityReading>>;
    fn contacts(&self) -> Result<Option<u32>>;
    fn calendar(&self) -> Result<Option<u32>>;
}

/// Screen metrics the host shell hands us; sysinfo cannot see a display.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenMetrics {
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
    pub font_scale: f64,
}

impl Default for ScreenMetrics {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
            pixel_ratio: 1.0,
            font_scale: 1.0,
        }
    }
}

/// `Platform` backed by the process host via sysinfo and the environment.
///
/// Battery, ambient, motion and social capabilities do not exist on a
/// desktop host and always fall through to the collector's defaults.
pub struct HostPlatform {
    screen: ScreenMetrics,
}

impl HostPlatform {
    pub fn new(screen: ScreenMetrics) -> Self {
        Self { screen }
    }
}

impl Default for HostPlatform {
    fn default() -> Self {
        Self::new(ScreenMetrics::default())
    }
}

impl Platform for HostPlatform {
    fn device(&self) -> Result<DeviceSignals> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            bail!("sysinfo does not support this host");
        }

        let mut system = System::new();
        system.refresh_memory();
        let total_memory = Some(system.total_memory()).filter(|bytes| *bytes > 0);

        Ok(DeviceSignals {
            // Desktop hosts expose no hardware model; the host name is
            // user-chosen and must not feed the identity.
            brand: None,
            model: None,
            os_name: System::name().unwrap_or_else(|| "unknown".into()),
            os_version: System::os_version().unwrap_or_else(|| "unknown".into()),
            total_memory_bytes: total_memory,
            device_class: DeviceClass::from_memory(total_memory),
            is_tablet: false,
            screen_width: self.screen.width,
            screen_height: self.screen.height,
            pixel_ratio: self.screen.pixel_ratio,
            font_scale: self.screen.font_scale,
            ..DeviceSignals::default()
        })
    }

    fn network(&self) -> Result<NetworkSignals> {
        let networks = Networks::new_with_refreshed_list();
        let mut network_type = NetworkType::None;

        for (name, _) in &networks {
            let kind = classify_interface(name);
            if kind == NetworkType::Wifi {
                network_type = kind;
                break;
            }
            if kind != NetworkType::None && network_type == NetworkType::None {
                network_type = kind;
            }
        }

        Ok(NetworkSignals {
            network_type,
            is_connected: network_type != NetworkType::None,
            is_metered: network_type == NetworkType::Cellular,
            ..NetworkSignals::default()
        })
    }

    fn battery(&self) -> Result<BatterySignals> {
        Err(anyhow!("battery status is not exposed on this host"))
    }

    fn locale(&self) -> Result<LocaleInfo> {
        let raw = std::env::var("LC_ALL")
            .or_else(|_| std::env::var("LANG"))
            .map_err(|_| anyhow!("no locale configured in environment"))?;
        let language_tag = parse_posix_locale(&raw)
            .ok_or_else(|| anyhow!("unrecognized locale '{raw}'"))?;
        let region = language_tag.split('-').nth(1).map(str::to_string);
        let timezone = std::env::var("TZ")
            .ok()
            .filter(|tz| !tz.is_empty())
            .unwrap_or_else(|| chrono::Local::now().format("%:z").to_string());

        Ok(LocaleInfo {
            language_tag,
            timezone,
            region,
        })
    }

    fn environment(&self) -> Result<EnvironmentSignals> {
        Err(anyhow!("ambient sensors are not exposed on this host"))
    }

    fn permission(&self, _capability: Capability) -> PermissionState {
        PermissionState::Unavailable
    }

    fn location(&self) -> Result<Option<Coordinates>> {
        Ok(None)
    }

    fn activity(&self) -> Result<Option<ActivityReading>> {
        Ok(None)
    }

    fn contacts(&self) -> Result<Option<u32>> {
        Ok(None)
    }

    fn calendar(&self) -> Result<Option<u32>> {
        Ok(None)
    }
}

fn classify_interface(name: &str) -> NetworkType {
    let name = name.to_ascii_lowercase();
    if name.starts_with("wl") || name.starts_with("wifi") || name.starts_with("wi-fi") {
        NetworkType::Wifi
    } else if name.starts_with("rmnet") || name.starts_with("wwan") || name.starts_with("ccmni") {
        NetworkType::Cellular
    } else if name.starts_with("eth") || name.starts_with("en") {
        NetworkType::Ethernet
    } else {
        NetworkType::None
    }
}

/// `en_IN.UTF-8` -> `en-IN`. `C`/`POSIX` carry no language.
fn parse_posix_locale(raw: &str) -> Option<String> {
    let base = raw.split(['.', '@']).next()?.trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.replace('_', "-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posix_locales_become_language_tags() {
        assert_eq!(parse_posix_locale("en_IN.UTF-8").as_deref(), Some("en-IN"));
        assert_eq!(parse_posix_locale("hi_IN@devanagari").as_deref(), Some("hi-IN"));
        assert_eq!(parse_posix_locale("C"), None);
        assert_eq!(parse_posix_locale(""), None);
    }

    #[test]
    fn interface_names_classify_by_prefix() {
        assert_eq!(classify_interface("wlan0"), NetworkType::Wifi);
        assert_eq!(classify_interface("rmnet_data0"), NetworkType::Cellular);
        assert_eq!(classify_interface("eth0"), NetworkType::Ethernet);
        assert_eq!(classify_interface("lo"), NetworkType::None);
    }

    #[test]
    fn host_gated_capabilities_are_unavailable() {
        let platform = HostPlatform::default();
        assert_eq!(
            platform.permission(Capability::Location),
            PermissionState::Unavailable
        );
        assert!(platform.battery().is_err());
    }

    #[test]
    fn host_device_has_no_user_chosen_model() {
        if let Ok(device) = HostPlatform::default().device() {
            assert_eq!(device.model, None);
            assert_eq!(device.brand, None);
        }
    }
}
