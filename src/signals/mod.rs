pub mod collector;
pub mod platform;
pub mod snapshot;
pub mod time_context;

pub use collector::SignalCollector;
pub use platform::{
    ActivityReading, Capability, Coordinates, HostPlatform, PermissionState, Platform,
    ScreenMetrics,
};
pub use snapshot::{
    AccessibilitySignals, ActivityKind, ActivitySignals, AppUsageSignals, BatterySignals,
    DeviceClass, DeviceSignals, EnvironmentSignals, LocationSignals, NetworkSignals, NetworkType,
    QuestionnaireSignals, SignalSnapshot, SocialSignals,
};
pub use time_context::{LocaleInfo, TimeContext, TimeOfDay};
