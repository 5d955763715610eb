//! Device/network conditions and the scheduling configuration derived from
//! them.

use serde::{Deserialize, Serialize};

/// Broad network attachment class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkClass {
    /// Wi-Fi or wired.
    Wifi,
    /// Cellular data.
    Cellular,
    /// Unknown attachment.
    #[default]
    Unknown,
}

/// Effective connection quality as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EffectiveQuality {
    /// Below 2G-class throughput.
    #[serde(rename = "slow-2g")]
    Slow2g,
    /// 2G-class throughput.
    #[serde(rename = "2g")]
    TwoG,
    /// 3G-class throughput.
    #[serde(rename = "3g")]
    ThreeG,
    /// 4G-class throughput or better.
    #[default]
    #[serde(rename = "4g")]
    FourG,
}

/// A sampled device/network condition.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceCondition {
    /// Network attachment class.
    pub network: NetworkClass,
    /// Effective connection quality.
    pub quality: EffectiveQuality,
    /// Whether the connection is metered.
    pub metered: bool,
    /// Battery level in [0, 1], when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery: Option<f64>,
    /// Whether the device is charging.
    pub charging: bool,
    /// Whether the OS power-save mode is active.
    pub power_save: bool,
}

impl DeviceCondition {
    /// Whether the change from `other` to `self` is significant enough to
    /// re-derive scheduling and emit a condition event: any flag flip, a
    /// network class change, or a battery move of at least 0.1.
    #[must_use]
    pub fn differs_significantly(&self, other: &Self) -> bool {
        if self.network != other.network
            || self.metered != other.metered
            || self.charging != other.charging
            || self.power_save != other.power_save
        {
            return true;
        }
        match (self.battery, other.battery) {
            (Some(a), Some(b)) => (a - b).abs() >= 0.1,
            (a, b) => a.is_some() != b.is_some(),
        }
    }

    /// Whether the connection counts as slow for delay scaling.
    #[must_use]
    pub fn is_slow(&self) -> bool {
        self.quality <= EffectiveQuality::TwoG
    }
}

/// Scheduling policy knobs, either user-configured or derived from a
/// [`DeviceCondition`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Prefer dispatching while on Wi-Fi: any non-Wi-Fi attachment derives
    /// the conservative posture (peak-hour avoidance, peak cap of one).
    pub prefer_wifi: bool,
    /// Block dispatch during the peak-hour window.
    pub avoid_peak_hours: bool,
    /// Peak window start hour (24h clock).
    pub peak_start_hour: u8,
    /// Peak window end hour, exclusive; wraps midnight when start > end.
    pub peak_end_hour: u8,
    /// Concurrency cap applied inside the peak window.
    pub peak_concurrency_cap: usize,
    /// Battery level below which dispatch stops unless charging.
    pub low_battery_threshold: f64,
    /// Pause dispatch entirely while charging.
    pub pause_while_charging: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            prefer_wifi: true,
            avoid_peak_hours: false,
            peak_start_hour: 18,
            peak_end_hour: 23,
            peak_concurrency_cap: 1,
            low_battery_threshold: 0.2,
            pause_while_charging: false,
        }
    }
}

impl SchedulerConfig {
    /// Whether `hour` falls inside the peak window, handling a window that
    /// wraps midnight.
    #[must_use]
    pub const fn in_peak_hours(&self, hour: u8) -> bool {
        if self.peak_start_hour <= self.peak_end_hour {
            hour >= self.peak_start_hour && hour < self.peak_end_hour
        } else {
            hour >= self.peak_start_hour || hour < self.peak_end_hour
        }
    }
}
