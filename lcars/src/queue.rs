//! Priority job queue with retry, cancellation, pause/resume, and progress
//! aggregation.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use lcars_core::{CancelToken, Clock};
use lcars_types::{
    Event, EventSink, Job, JobId, JobSpec, JobStatus, LcarsError, QueueConfig, QueueProgress,
};

/// Executes one job on behalf of the queue.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Run the job to completion or error. Implementations observe `cancel`
    /// at their suspension points.
    async fn run_job(&self, job: &Job, cancel: &CancelToken) -> Result<(), LcarsError>;
}

/// Priority-ordered background job queue.
///
/// Dispatch picks the highest-priority pending job whose scheduled time has
/// arrived, breaking ties by oldest creation. Terminal jobs move to a
/// bounded history. For each `(episode, kind)` pair at most one non-terminal
/// job exists at a time; duplicates are rejected at `add_job`.
///
/// Cloning is cheap; clones share the same queue.
#[derive(Clone)]
pub struct JobQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    cfg: QueueConfig,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
    state: Mutex<QueueState>,
    next_id: AtomicU64,
}

struct QueueState {
    /// Live (non-terminal) jobs by id.
    jobs: BTreeMap<u64, Job>,
    cancels: HashMap<u64, CancelToken>,
    history: VecDeque<Job>,
    durations: VecDeque<Duration>,
    running: usize,
    paused: bool,
    completed: usize,
    failed: usize,
    cancelled: usize,
}

impl JobQueue {
    /// An empty queue.
    #[must_use]
    pub fn new(cfg: QueueConfig, clock: Arc<dyn Clock>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                cfg,
                clock,
                sink,
                state: Mutex::new(QueueState {
                    jobs: BTreeMap::new(),
                    cancels: HashMap::new(),
                    history: VecDeque::new(),
                    durations: VecDeque::new(),
                    running: 0,
                    paused: false,
                    completed: 0,
                    failed: 0,
                    cancelled: 0,
                }),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Enqueue a job.
    ///
    /// # Errors
    /// `Validation` when a non-terminal job of the same kind already exists
    /// for the same episode.
    pub fn add_job(&self, spec: JobSpec) -> Result<JobId, LcarsError> {
        let now = self.inner.clock.now_utc();
        let mut state = self.inner.lock_state();
        if state
            .jobs
            .values()
            .any(|j| j.episode == spec.episode && j.kind == spec.kind)
        {
            return Err(LcarsError::Validation(format!(
                "a non-terminal {} job already exists for {}",
                spec.kind.as_str(),
                spec.episode
            )));
        }
        let id = JobId(self.inner.next_id.fetch_add(1, Ordering::SeqCst));
        let job = Job {
            id,
            episode: spec.episode,
            kind: spec.kind,
            priority: spec.priority,
            status: JobStatus::Pending,
            retry_count: 0,
            max_retries: spec.max_retries.unwrap_or(self.inner.cfg.default_max_retries),
            created_at: now,
            updated_at: now,
            scheduled_at: now,
            last_error: None,
            strategy: spec.strategy,
            target_sources: spec.target_sources,
        };
        state.jobs.insert(id.0, job.clone());
        self.inner.sink.emit(&Event::JobAdded { job });
        Ok(id)
    }

    /// Cancel one job. Pending jobs transition immediately; in-progress jobs
    /// observe cancellation at their next suspension point.
    ///
    /// # Errors
    /// `NotFound` when the id does not name a live job.
    pub fn cancel_job(&self, id: JobId) -> Result<(), LcarsError> {
        let mut state = self.inner.lock_state();
        let Some(job) = state.jobs.get(&id.0) else {
            return Err(LcarsError::not_found(format!("{id}")));
        };
        match job.status {
            JobStatus::Pending => {
                let mut job = state.jobs.remove(&id.0).expect("checked above");
                job.status = JobStatus::Cancelled;
                job.updated_at = self.inner.clock.now_utc();
                state.cancelled += 1;
                self.inner.finish(&mut state, job);
                Ok(())
            }
            JobStatus::InProgress => {
                if let Some(token) = state.cancels.get(&id.0) {
                    token.cancel();
                }
                Ok(())
            }
            // Live jobs are never terminal; nothing to do.
            _ => Ok(()),
        }
    }

    /// Cancel every pending and in-progress job.
    pub fn cancel_all(&self) {
        let mut state = self.inner.lock_state();
        let pending: Vec<u64> = state
            .jobs
            .iter()
            .filter(|(_, j)| j.status == JobStatus::Pending)
            .map(|(id, _)| *id)
            .collect();
        for id in pending {
            let mut job = state.jobs.remove(&id).expect("id collected above");
            job.status = JobStatus::Cancelled;
            job.updated_at = self.inner.clock.now_utc();
            state.cancelled += 1;
            self.inner.finish(&mut state, job);
        }
        for token in state.cancels.values() {
            token.cancel();
        }
    }

    /// Halt dispatch. In-progress jobs are not interrupted.
    pub fn pause(&self, reason: &str) {
        let mut state = self.inner.lock_state();
        if !state.paused {
            state.paused = true;
            self.inner.sink.emit(&Event::QueuePaused {
                reason: reason.to_string(),
            });
        }
    }

    /// Resume dispatch.
    pub fn resume(&self, reason: &str) {
        let mut state = self.inner.lock_state();
        if state.paused {
            state.paused = false;
            self.inner.sink.emit(&Event::QueueResumed {
                reason: reason.to_string(),
            });
        }
    }

    /// Whether dispatch is currently paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.inner.lock_state().paused
    }

    /// Aggregated counters with an ETA from the rolling duration average.
    #[must_use]
    pub fn progress(&self) -> QueueProgress {
        let state = self.inner.lock_state();
        let pending = state
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Pending)
            .count();
        let remaining = pending + state.running;
        let estimated_completion = if remaining > 0 && !state.durations.is_empty() {
            let total: Duration = state.durations.iter().sum();
            let avg = total / state.durations.len() as u32;
            let slots = self.inner.cfg.max_concurrent.max(1);
            let cycles = remaining.div_ceil(slots) as u32;
            chrono::Duration::from_std(avg * cycles)
                .ok()
                .map(|d| self.inner.clock.now_utc() + d)
        } else {
            None
        };
        QueueProgress {
            total: state.jobs.len() + state.completed + state.failed + state.cancelled,
            pending,
            running: state.running,
            completed: state.completed,
            failed: state.failed,
            cancelled: state.cancelled,
            paused: state.paused,
            estimated_completion,
        }
    }

    /// Look up a job by id, live or recent history.
    #[must_use]
    pub fn job(&self, id: JobId) -> Option<Job> {
        let state = self.inner.lock_state();
        state
            .jobs
            .get(&id.0)
            .cloned()
            .or_else(|| state.history.iter().find(|j| j.id == id).cloned())
    }

    /// Live (non-terminal) jobs, unordered.
    #[must_use]
    pub fn live_jobs(&self) -> Vec<Job> {
        self.inner.lock_state().jobs.values().cloned().collect()
    }

    /// Run the dispatch loop until `shutdown` fires.
    ///
    /// Each cycle consults the scheduler gate (when present), fills free
    /// slots in (priority desc, created-at asc) order, then sleeps for the
    /// processing interval. One job is dispatched within a cycle of its
    /// scheduled time whenever a slot is free and the gate permits.
    pub async fn run(
        &self,
        runner: Arc<dyn JobRunner>,
        scheduler: Option<Arc<crate::Scheduler>>,
        shutdown: CancelToken,
    ) {
        loop {
            if shutdown.is_cancelled() {
                break;
            }
            let permitted = scheduler.as_ref().is_none_or(|s| s.should_dispatch());
            if permitted {
                let cap = scheduler
                    .as_ref()
                    .map_or(self.inner.cfg.max_concurrent, |s| {
                        s.effective_concurrency(self.inner.cfg.max_concurrent)
                    });
                self.dispatch_ready(&runner, cap);
            }
            // While gated, back off on the scheduler's condition-derived
            // delay instead of the dispatch interval.
            let interval = if permitted {
                self.inner.cfg.processing_interval
            } else {
                scheduler
                    .as_ref()
                    .map_or(self.inner.cfg.processing_interval, |s| s.next_delay())
            };
            tokio::select! {
                () = shutdown.cancelled() => break,
                () = tokio::time::sleep(interval) => {}
            }
        }
    }

    /// Fill free execution slots from the pending set. Exposed for tests
    /// that drive the queue without the loop.
    pub fn dispatch_ready(&self, runner: &Arc<dyn JobRunner>, cap: usize) {
        let now = self.inner.clock.now_utc();
        let mut state = self.inner.lock_state();
        if state.paused {
            return;
        }
        while state.running < cap {
            let next = state
                .jobs
                .values()
                .filter(|j| j.status == JobStatus::Pending && j.scheduled_at <= now)
                .min_by_key(|j| (std::cmp::Reverse(j.priority), j.created_at, j.id))
                .map(|j| j.id);
            let Some(id) = next else { break };

            let job = state.jobs.get_mut(&id.0).expect("selected above");
            job.status = JobStatus::InProgress;
            job.updated_at = now;
            let first_dispatch = job.retry_count == 0;
            let snapshot = job.clone();

            let token = CancelToken::new();
            state.cancels.insert(id.0, token.clone());
            state.running += 1;
            if first_dispatch {
                self.inner.sink.emit(&Event::JobStarted {
                    job: snapshot.clone(),
                });
            }

            let inner = Arc::clone(&self.inner);
            let runner = Arc::clone(runner);
            tokio::spawn(async move {
                let started = tokio::time::Instant::now();
                let result = match tokio::time::timeout(
                    inner.cfg.job_timeout,
                    runner.run_job(&snapshot, &token),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(LcarsError::timeout(format!(
                        "{} for {}",
                        snapshot.kind.as_str(),
                        snapshot.episode
                    ))),
                };
                inner.complete(snapshot.id, result, started.elapsed(), &token);
            });
        }
    }
}

impl QueueInner {
    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().expect("mutex poisoned")
    }

    /// Move a terminal job into bounded history and emit its event.
    fn finish(&self, state: &mut QueueState, job: Job) {
        let event = match job.status {
            JobStatus::Completed => Event::JobCompleted { job: job.clone() },
            JobStatus::Failed => Event::JobFailed { job: job.clone() },
            _ => Event::JobCancelled { job: job.clone() },
        };
        state.history.push_back(job);
        while state.history.len() > self.cfg.history_limit {
            state.history.pop_front();
        }
        self.sink.emit(&event);
    }

    /// Whether a job-level retry may help.
    fn retryable(err: &LcarsError) -> bool {
        match err {
            LcarsError::Exhausted { .. } => true,
            LcarsError::AllProvidersFailed(list) => list.iter().any(Self::retryable),
            other => other.is_transient(),
        }
    }

    fn complete(
        &self,
        id: JobId,
        result: Result<(), LcarsError>,
        elapsed: Duration,
        token: &CancelToken,
    ) {
        let mut state = self.lock_state();
        state.running = state.running.saturating_sub(1);
        state.cancels.remove(&id.0);
        let Some(mut job) = state.jobs.remove(&id.0) else {
            return;
        };
        let now = self.clock.now_utc();
        job.updated_at = now;

        if token.is_cancelled() || matches!(result, Err(LcarsError::Cancelled)) {
            job.status = JobStatus::Cancelled;
            state.cancelled += 1;
            self.finish(&mut state, job);
            return;
        }

        match result {
            Ok(()) => {
                job.status = JobStatus::Completed;
                state.completed += 1;
                state.durations.push_back(elapsed);
                while state.durations.len() > self.cfg.duration_window {
                    state.durations.pop_front();
                }
                self.finish(&mut state, job);
            }
            Err(err) => {
                job.last_error = Some(format!("[{}] {err}", err.category()));
                if Self::retryable(&err) && job.retry_count < job.max_retries {
                    job.retry_count += 1;
                    job.status = JobStatus::Pending;
                    let backoff = self
                        .cfg
                        .retry_base_delay
                        .saturating_mul(1u32 << job.retry_count.min(16));
                    job.scheduled_at = now
                        + chrono::Duration::from_std(backoff)
                            .unwrap_or_else(|_| chrono::Duration::seconds(60));
                    tracing::debug!(
                        target: "lcars::queue",
                        job = %id,
                        retry = job.retry_count,
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        "requeueing failed job"
                    );
                    state.jobs.insert(id.0, job);
                } else {
                    job.status = JobStatus::Failed;
                    state.failed += 1;
                    self.finish(&mut state, job);
                }
            }
        }
    }
}
