use std::sync::Mutex;

use lcars_types::{Event, EventSink};

/// Event sink that records everything for later assertions.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<Event>>,
}

impl CollectingSink {
    /// An empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event observed so far, in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("mutex poisoned").clone()
    }

    /// Compact event labels, handy for ordering assertions.
    #[must_use]
    pub fn labels(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .expect("mutex poisoned")
            .iter()
            .map(|e| match e {
                Event::JobAdded { .. } => "job-added",
                Event::JobStarted { .. } => "job-started",
                Event::JobCompleted { .. } => "job-completed",
                Event::JobFailed { .. } => "job-failed",
                Event::JobCancelled { .. } => "job-cancelled",
                Event::QueuePaused { .. } => "queue-paused",
                Event::QueueResumed { .. } => "queue-resumed",
                Event::SyncCapabilityChanged { .. } => "sync-capability-change",
                Event::ConditionChanged { .. } => "condition-changed",
                Event::WarmingStatsUpdated { .. } => "warming-stats",
                Event::MigrationStarted { .. } => "migration-started",
                Event::MigrationCompleted { .. } => "migration-completed",
                Event::MigrationRolledBack { .. } => "migration-rolled-back",
                _ => "other",
            })
            .collect()
    }

    /// Drop everything recorded so far.
    pub fn clear(&self) {
        self.events.lock().expect("mutex poisoned").clear();
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: &Event) {
        self.events.lock().expect("mutex poisoned").push(event.clone());
    }
}
