//! Soft per-provider call budgets over a sliding window.

use std::sync::Mutex;

use tokio::time::Instant;

use lcars_types::{LcarsError, QuotaConfig};

/// Window-scoped call budget (daily by default).
///
/// The budget is soft: exceeding it blocks further calls until the window
/// resets, surfacing `QuotaExceeded` with the remaining units and reset
/// time.
pub struct DailyQuota {
    cfg: QuotaConfig,
    runtime: Mutex<QuotaRuntime>,
}

struct QuotaRuntime {
    calls_made_in_window: u64,
    last_reset: Instant,
}

impl DailyQuota {
    /// A fresh budget with its window starting now.
    #[must_use]
    pub fn new(cfg: QuotaConfig) -> Self {
        Self {
            cfg,
            runtime: Mutex::new(QuotaRuntime {
                calls_made_in_window: 0,
                last_reset: Instant::now(),
            }),
        }
    }

    /// Consume one unit if the window has room.
    ///
    /// # Errors
    /// Returns `LcarsError::QuotaExceeded` when the window budget is spent;
    /// `reset_in_ms` reflects the time until the window rolls over.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn should_allow_call(&self) -> Result<(), LcarsError> {
        let mut rt = self.runtime.lock().expect("mutex poisoned");
        let now = Instant::now();

        if now.duration_since(rt.last_reset) >= self.cfg.window {
            rt.calls_made_in_window = 0;
            rt.last_reset = now;
        }

        if rt.calls_made_in_window < self.cfg.limit {
            rt.calls_made_in_window += 1;
            return Ok(());
        }

        let elapsed = now.duration_since(rt.last_reset);
        let reset_in_ms: u64 = self
            .cfg
            .window
            .saturating_sub(elapsed)
            .as_millis()
            .try_into()
            .unwrap_or(u64::MAX);
        Err(LcarsError::QuotaExceeded {
            remaining: self.cfg.limit.saturating_sub(rt.calls_made_in_window),
            reset_in_ms,
        })
    }
}
