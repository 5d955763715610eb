//! Retry policy: exponential backoff with jitter, bounded attempts.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use lcars_core::CancelToken;
use lcars_types::{LcarsError, RetryConfig};

/// Drives an operation under exponential backoff.
///
/// Retryable failures are those `LcarsError::is_transient` reports: network
/// errors, timeouts, HTTP 429 and 5xx. Everything else surfaces immediately.
/// On exhaustion the last error is wrapped in `LcarsError::Exhausted`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    cfg: RetryConfig,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl RetryPolicy {
    /// A policy from its configuration.
    #[must_use]
    pub const fn new(cfg: RetryConfig) -> Self {
        Self { cfg }
    }

    /// The configured retry budget.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.cfg.max_retries
    }

    /// Backoff before retry number `attempt` (1-based):
    /// `min(max_delay, initial * multiplier^(attempt-1))` plus uniform jitter
    /// in `[-jitter, +jitter]`, clamped at zero.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.cfg.initial_delay.as_secs_f64()
            * self
                .cfg
                .backoff_multiplier
                .powi(attempt.saturating_sub(1) as i32);
        let base = exp.min(self.cfg.max_delay.as_secs_f64());
        let jitter = self.cfg.jitter.as_secs_f64();
        let offset = if jitter > 0.0 {
            rand::rng().random_range(-jitter..=jitter)
        } else {
            0.0
        };
        Duration::from_secs_f64((base + offset).max(0.0))
    }

    /// Run `op` until it succeeds, fails permanently, exhausts the budget, or
    /// is cancelled. The attempt number passed to `op` is 1-based.
    ///
    /// # Errors
    /// Propagates permanent failures unchanged, reports `Cancelled` when the
    /// token fires while waiting, and wraps the final transient failure in
    /// `Exhausted` once the budget is spent.
    pub async fn run<T, F, Fut>(
        &self,
        cancel: &CancelToken,
        mut op: F,
    ) -> Result<T, LcarsError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, LcarsError>>,
    {
        let mut attempt = 0u32;
        loop {
            if cancel.is_cancelled() {
                return Err(LcarsError::Cancelled);
            }
            attempt += 1;
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt <= self.cfg.max_retries => {
                    let delay = self.delay_for(attempt);
                    tracing::debug!(
                        target: "lcars::middleware::retry",
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "transient failure, backing off"
                    );
                    tokio::select! {
                        () = cancel.cancelled() => return Err(LcarsError::Cancelled),
                        () = tokio::time::sleep(delay) => {}
                    }
                }
                Err(err) if err.is_transient() => {
                    return Err(LcarsError::Exhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }
}
