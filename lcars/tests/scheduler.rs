use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use lcars::{Scheduler, SharedCondition};
use lcars_mock::{CollectingSink, ManualClock};
use lcars_types::{DeviceCondition, EffectiveQuality, NetworkClass, SchedulerConfig};

fn at_hour(hour: u32) -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 30, 0).unwrap(),
    ))
}

fn wifi() -> DeviceCondition {
    DeviceCondition {
        network: NetworkClass::Wifi,
        quality: EffectiveQuality::FourG,
        metered: false,
        battery: Some(0.9),
        charging: false,
        power_save: false,
    }
}

fn scheduler(
    condition: DeviceCondition,
    cfg: SchedulerConfig,
    hour: u32,
) -> (Scheduler, Arc<SharedCondition>, Arc<CollectingSink>) {
    let source = Arc::new(SharedCondition::new(condition));
    let sink = Arc::new(CollectingSink::new());
    let scheduler = Scheduler::new(source.clone(), cfg, at_hour(hour), sink.clone());
    (scheduler, source, sink)
}

#[test]
fn peak_hours_block_dispatch_when_avoidance_is_on() {
    let cfg = SchedulerConfig {
        avoid_peak_hours: true,
        peak_start_hour: 18,
        peak_end_hour: 23,
        ..SchedulerConfig::default()
    };
    let (inside, _, _) = scheduler(wifi(), cfg, 19);
    assert!(!inside.should_dispatch());
    let (outside, _, _) = scheduler(wifi(), cfg, 10);
    assert!(outside.should_dispatch());
}

#[test]
fn low_battery_blocks_unless_charging() {
    let cfg = SchedulerConfig::default();
    let drained = DeviceCondition {
        battery: Some(0.1),
        ..wifi()
    };
    let (s, _, _) = scheduler(drained, cfg, 10);
    assert!(!s.should_dispatch());

    let charging = DeviceCondition {
        battery: Some(0.1),
        charging: true,
        ..wifi()
    };
    let (s, _, _) = scheduler(charging, cfg, 10);
    assert!(s.should_dispatch());
}

#[test]
fn pause_while_charging_blocks_when_plugged_in() {
    let cfg = SchedulerConfig {
        pause_while_charging: true,
        ..SchedulerConfig::default()
    };
    let plugged = DeviceCondition {
        charging: true,
        ..wifi()
    };
    let (s, _, _) = scheduler(plugged, cfg, 10);
    assert!(!s.should_dispatch());
}

#[test]
fn metered_connections_derive_a_conservative_peak_cap() {
    let base = SchedulerConfig {
        peak_concurrency_cap: 3,
        ..SchedulerConfig::default()
    };
    let metered = DeviceCondition {
        metered: true,
        network: NetworkClass::Cellular,
        ..wifi()
    };
    let derived = Scheduler::derive(&base, &metered);
    assert_eq!(derived.peak_concurrency_cap, 1);
}

#[test]
fn prefer_wifi_is_conservative_off_wifi() {
    let cfg = SchedulerConfig {
        prefer_wifi: true,
        avoid_peak_hours: false,
        peak_start_hour: 18,
        peak_end_hour: 23,
        peak_concurrency_cap: 3,
        ..SchedulerConfig::default()
    };
    let cellular = DeviceCondition {
        network: NetworkClass::Cellular,
        ..wifi()
    };
    let derived = Scheduler::derive(&cfg, &cellular);
    assert_eq!(derived.peak_concurrency_cap, 1);
    assert!(derived.avoid_peak_hours);

    // Off Wi-Fi the derived avoidance blocks dispatch inside the peak
    // window and caps concurrency there.
    let (s, _, _) = scheduler(cellular, cfg, 19);
    assert!(!s.should_dispatch());
    assert_eq!(s.effective_concurrency(3), 1);
    let (s, _, _) = scheduler(cellular, cfg, 10);
    assert!(s.should_dispatch());

    // Without the preference the same condition dispatches in peak.
    let relaxed = SchedulerConfig {
        prefer_wifi: false,
        ..cfg
    };
    let (s, _, _) = scheduler(cellular, relaxed, 19);
    assert!(s.should_dispatch());
}

#[test]
fn power_save_halves_the_cap_and_forces_peak_avoidance() {
    let base = SchedulerConfig {
        peak_concurrency_cap: 4,
        avoid_peak_hours: false,
        ..SchedulerConfig::default()
    };
    let saving = DeviceCondition {
        power_save: true,
        ..wifi()
    };
    let derived = Scheduler::derive(&base, &saving);
    assert_eq!(derived.peak_concurrency_cap, 2);
    assert!(derived.avoid_peak_hours);
}

#[test]
fn effective_concurrency_caps_in_peak_and_on_low_battery() {
    let cfg = SchedulerConfig {
        peak_start_hour: 18,
        peak_end_hour: 23,
        peak_concurrency_cap: 1,
        ..SchedulerConfig::default()
    };
    let (in_peak, _, _) = scheduler(wifi(), cfg, 19);
    assert_eq!(in_peak.effective_concurrency(3), 1);
    let (off_peak, _, _) = scheduler(wifi(), cfg, 10);
    assert_eq!(off_peak.effective_concurrency(3), 3);

    let drained = DeviceCondition {
        battery: Some(0.05),
        ..wifi()
    };
    let (s, _, _) = scheduler(drained, cfg, 10);
    assert_eq!(s.effective_concurrency(3), 1);
}

#[test]
fn next_delay_scales_with_conditions() {
    let cfg = SchedulerConfig {
        peak_start_hour: 18,
        peak_end_hour: 23,
        ..SchedulerConfig::default()
    };
    // Wi-Fi halves the 5-minute baseline.
    let (s, _, _) = scheduler(wifi(), cfg, 10);
    assert_eq!(s.next_delay(), Duration::from_secs(150));

    // Peak hours triple it first.
    let (s, _, _) = scheduler(wifi(), cfg, 19);
    assert_eq!(s.next_delay(), Duration::from_secs(450));

    // Metered cellular doubles the baseline.
    let metered = DeviceCondition {
        network: NetworkClass::Cellular,
        metered: true,
        ..wifi()
    };
    let (s, _, _) = scheduler(metered, cfg, 10);
    assert_eq!(s.next_delay(), Duration::from_secs(600));

    // Low battery quadruples on top of the Wi-Fi halving.
    let drained = DeviceCondition {
        battery: Some(0.05),
        ..wifi()
    };
    let (s, _, _) = scheduler(drained, cfg, 10);
    assert_eq!(s.next_delay(), Duration::from_secs(600));
}

#[test]
fn refresh_emits_condition_and_capability_events() {
    let (s, source, sink) = scheduler(wifi(), SchedulerConfig::default(), 10);
    assert!(s.should_dispatch());

    // Small battery drift is not significant.
    source.set(DeviceCondition {
        battery: Some(0.85),
        ..wifi()
    });
    s.refresh();
    assert!(sink.events().is_empty());

    // Dropping below the threshold is significant and flips the verdict.
    source.set(DeviceCondition {
        battery: Some(0.1),
        ..wifi()
    });
    s.refresh();
    let labels = sink.labels();
    assert_eq!(labels, vec!["condition-changed", "sync-capability-change"]);
    assert!(!s.should_dispatch());
}
