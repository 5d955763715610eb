//! Typed events emitted by the queue, scheduler, warmer, and migration
//! engine.

use serde::{Deserialize, Serialize};

use crate::condition::DeviceCondition;
use crate::job::{Job, WarmingStats};
use crate::migrate::MigrationRecord;

/// Everything the subsystem components report to observers.
///
/// Emissions for a single job follow its state-transition order: added,
/// started, then exactly one of completed/failed/cancelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
#[non_exhaustive]
pub enum Event {
    /// A job entered the queue.
    JobAdded {
        /// The job as enqueued.
        job: Job,
    },
    /// A job was dispatched for the first time.
    JobStarted {
        /// The job at dispatch.
        job: Job,
    },
    /// A job finished successfully.
    JobCompleted {
        /// The terminal job.
        job: Job,
    },
    /// A job failed terminally (retries exhausted or permanent error).
    JobFailed {
        /// The terminal job, carrying `last_error`.
        job: Job,
    },
    /// A job was cancelled.
    JobCancelled {
        /// The terminal job.
        job: Job,
    },
    /// Dispatch was paused.
    QueuePaused {
        /// Why dispatch stopped.
        reason: String,
    },
    /// Dispatch resumed.
    QueueResumed {
        /// Why dispatch resumed.
        reason: String,
    },
    /// The scheduler's dispatch verdict flipped.
    SyncCapabilityChanged {
        /// Whether the queue may currently dispatch.
        can_dispatch: bool,
    },
    /// A significant device/network condition change.
    ConditionChanged {
        /// The newly sampled condition.
        condition: DeviceCondition,
    },
    /// The cache warmer refreshed its statistics.
    WarmingStatsUpdated {
        /// Current warming counters.
        stats: WarmingStats,
    },
    /// A migration transaction opened.
    MigrationStarted {
        /// The transaction id.
        transaction: u64,
    },
    /// A migration committed.
    MigrationCompleted {
        /// The history entry recorded for the commit.
        record: MigrationRecord,
    },
    /// An open transaction was aborted and the original progress restored.
    MigrationRolledBack {
        /// The transaction id.
        transaction: u64,
    },
}

/// Observer interface for [`Event`] emissions.
///
/// Sinks must be cheap and non-blocking; components call them while holding
/// internal locks.
pub trait EventSink: Send + Sync {
    /// Observe one event.
    fn emit(&self, event: &Event);
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &Event) {}
}
