//! Condition-aware scheduling policy.
//!
//! The scheduler samples device/network conditions, derives a scheduling
//! configuration, and exposes `should_dispatch()` / `next_delay()` for the
//! queue to consult. It never drives the queue directly.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Timelike as _;

use lcars_core::{CancelToken, Clock};
use lcars_types::{DeviceCondition, Event, EventSink, SchedulerConfig};

/// Baseline delay between dispatch cycles.
const BASE_DELAY: Duration = Duration::from_secs(5 * 60);

/// Platform hook supplying the current device/network condition.
pub trait ConditionSource: Send + Sync {
    /// Sample the current condition.
    fn sample(&self) -> DeviceCondition;
}

/// A hand-settable condition source for embedding and tests.
#[derive(Default)]
pub struct SharedCondition {
    condition: Mutex<DeviceCondition>,
}

impl SharedCondition {
    /// A source reporting the given condition until changed.
    #[must_use]
    pub fn new(condition: DeviceCondition) -> Self {
        Self {
            condition: Mutex::new(condition),
        }
    }

    /// Replace the reported condition.
    pub fn set(&self, condition: DeviceCondition) {
        *self.condition.lock().expect("mutex poisoned") = condition;
    }
}

impl ConditionSource for SharedCondition {
    fn sample(&self) -> DeviceCondition {
        *self.condition.lock().expect("mutex poisoned")
    }
}

struct SchedState {
    condition: DeviceCondition,
    derived: SchedulerConfig,
    last_verdict: bool,
}

/// Gates queue dispatch by device/network conditions and user preferences.
pub struct Scheduler {
    source: Arc<dyn ConditionSource>,
    base: SchedulerConfig,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
    state: Mutex<SchedState>,
}

impl Scheduler {
    /// A scheduler over `source`, sampling once immediately.
    #[must_use]
    pub fn new(
        source: Arc<dyn ConditionSource>,
        base: SchedulerConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let condition = source.sample();
        let derived = Self::derive(&base, &condition);
        let hour = clock.now_utc().hour() as u8;
        let last_verdict = Self::verdict(&derived, &condition, hour);
        Self {
            source,
            base,
            clock,
            sink,
            state: Mutex::new(SchedState {
                condition,
                derived,
                last_verdict,
            }),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SchedState> {
        self.state.lock().expect("mutex poisoned")
    }

    /// Derive the effective config from a condition: metered connections get
    /// a conservative peak cap; with `prefer_wifi` set, any non-Wi-Fi
    /// attachment is treated the same way and additionally avoids peak
    /// hours; power-save halves the cap and forces peak-hour avoidance.
    #[must_use]
    pub fn derive(base: &SchedulerConfig, condition: &DeviceCondition) -> SchedulerConfig {
        let mut cfg = *base;
        if condition.metered {
            cfg.peak_concurrency_cap = cfg.peak_concurrency_cap.min(1);
        }
        if base.prefer_wifi && !matches!(condition.network, lcars_types::NetworkClass::Wifi) {
            cfg.peak_concurrency_cap = cfg.peak_concurrency_cap.min(1);
            cfg.avoid_peak_hours = true;
        }
        if condition.power_save {
            cfg.peak_concurrency_cap = (cfg.peak_concurrency_cap / 2).max(1);
            cfg.avoid_peak_hours = true;
        }
        cfg
    }

    fn verdict(cfg: &SchedulerConfig, condition: &DeviceCondition, hour: u8) -> bool {
        if cfg.avoid_peak_hours && cfg.in_peak_hours(hour) {
            return false;
        }
        if let Some(battery) = condition.battery
            && battery < cfg.low_battery_threshold
            && !condition.charging
        {
            return false;
        }
        if cfg.pause_while_charging && condition.charging {
            return false;
        }
        true
    }

    /// Re-sample the condition. Significant changes re-derive the config and
    /// emit `condition-changed`, plus `sync-capability-change` when the
    /// dispatch verdict flips.
    pub fn refresh(&self) -> DeviceCondition {
        let condition = self.source.sample();
        let hour = self.current_hour();
        let mut state = self.lock_state();
        if condition.differs_significantly(&state.condition) {
            state.condition = condition;
            state.derived = Self::derive(&self.base, &condition);
            self.sink.emit(&Event::ConditionChanged { condition });
        } else {
            state.condition = condition;
        }
        let verdict = Self::verdict(&state.derived, &state.condition, hour);
        if verdict != state.last_verdict {
            state.last_verdict = verdict;
            self.sink.emit(&Event::SyncCapabilityChanged {
                can_dispatch: verdict,
            });
        }
        condition
    }

    fn current_hour(&self) -> u8 {
        self.clock.now_utc().hour() as u8
    }

    /// The gating predicate the queue consults before dispatching.
    #[must_use]
    pub fn should_dispatch(&self) -> bool {
        let state = self.lock_state();
        Self::verdict(&state.derived, &state.condition, self.current_hour())
    }

    /// Concurrency cap for the current condition: the peak-hour cap inside
    /// the peak window, and a cap of one on low battery while discharging.
    #[must_use]
    pub fn effective_concurrency(&self, base_cap: usize) -> usize {
        let state = self.lock_state();
        let mut cap = base_cap;
        if state.derived.in_peak_hours(self.current_hour()) {
            cap = cap.min(state.derived.peak_concurrency_cap);
        }
        if let Some(battery) = state.condition.battery
            && battery < state.derived.low_battery_threshold
            && !state.condition.charging
        {
            cap = cap.min(1);
        }
        cap.max(1)
    }

    /// Delay until the next dispatch cycle: a 5-minute baseline, tripled in
    /// peak hours, halved on Wi-Fi, doubled on metered or slow links, and
    /// quadrupled on low battery.
    #[must_use]
    pub fn next_delay(&self) -> Duration {
        let state = self.lock_state();
        let mut delay = BASE_DELAY;
        if state.derived.in_peak_hours(self.current_hour()) {
            delay *= 3;
        }
        if matches!(state.condition.network, lcars_types::NetworkClass::Wifi) {
            delay /= 2;
        }
        if state.condition.metered || state.condition.is_slow() {
            delay *= 2;
        }
        if let Some(battery) = state.condition.battery
            && battery < state.derived.low_battery_threshold
        {
            delay *= 4;
        }
        delay
    }

    /// The most recently sampled condition.
    #[must_use]
    pub fn condition(&self) -> DeviceCondition {
        self.lock_state().condition
    }

    /// Sampling loop: refresh on an interval until `shutdown` fires.
    pub async fn run(&self, interval: Duration, shutdown: CancelToken) {
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                () = tokio::time::sleep(interval) => {
                    self.refresh();
                }
            }
        }
    }
}
