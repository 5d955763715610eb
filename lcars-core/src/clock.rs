//! Wall-clock abstraction. Monotonic timing uses `tokio::time` directly.

use chrono::{DateTime, Utc};

/// Source of wall-clock timestamps (ISO-8601 UTC, millisecond precision).
pub trait Clock: Send + Sync {
    /// The current wall-clock time.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
