use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use lcars_core::{CancelToken, MetadataProvider, ProviderProfile};
use lcars_types::{EpisodeId, LcarsError, MetadataSource, ProviderRecord};

/// Scriptable provider for tests: serves canned records, optional one-shot
/// or persistent failures, and an optional artificial delay so cancellation
/// and timeout paths can be exercised.
pub struct MockProvider {
    source: MetadataSource,
    records: Mutex<HashMap<EpisodeId, ProviderRecord>>,
    failures: Mutex<Vec<LcarsError>>,
    fail_always: Mutex<Option<LcarsError>>,
    delay: Mutex<Option<Duration>>,
    available: AtomicBool,
    calls: AtomicUsize,
}

impl MockProvider {
    /// A provider with no data for the given source tag.
    #[must_use]
    pub fn new(source: MetadataSource) -> Self {
        Self {
            source,
            records: Mutex::new(HashMap::new()),
            failures: Mutex::new(Vec::new()),
            fail_always: Mutex::new(None),
            delay: Mutex::new(None),
            available: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    /// Serve `record` for its episode.
    #[must_use]
    pub fn with_record(self, record: ProviderRecord) -> Self {
        self.records
            .lock()
            .expect("mutex poisoned")
            .insert(record.episode.clone(), record);
        self
    }

    /// Fail the next call with `err`, then continue normally. Queued
    /// failures are consumed in order.
    #[must_use]
    pub fn fail_once(self, err: LcarsError) -> Self {
        self.failures.lock().expect("mutex poisoned").push(err);
        self
    }

    /// Fail every call with `err`.
    #[must_use]
    pub fn fail_always(self, err: LcarsError) -> Self {
        *self.fail_always.lock().expect("mutex poisoned") = Some(err);
        self
    }

    /// Sleep for `delay` before answering.
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().expect("mutex poisoned") = Some(delay);
        self
    }

    /// Mark the provider unavailable (missing credentials).
    #[must_use]
    pub fn unavailable(self) -> Self {
        self.available.store(false, Ordering::SeqCst);
        self
    }

    /// Number of `fetch_episode` calls made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataProvider for MockProvider {
    fn name(&self) -> &'static str {
        "lcars-mock"
    }

    fn source(&self) -> MetadataSource {
        self.source
    }

    fn profile(&self) -> ProviderProfile {
        ProviderProfile::baseline(self.source)
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn fetch_episode(
        &self,
        id: &EpisodeId,
        cancel: &CancelToken,
    ) -> Result<Option<ProviderRecord>, LcarsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().expect("mutex poisoned");
        if let Some(delay) = delay {
            tokio::select! {
                () = cancel.cancelled() => return Err(LcarsError::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
        }
        if cancel.is_cancelled() {
            return Err(LcarsError::Cancelled);
        }
        if let Some(err) = self.fail_always.lock().expect("mutex poisoned").clone() {
            return Err(err);
        }
        {
            let mut failures = self.failures.lock().expect("mutex poisoned");
            if !failures.is_empty() {
                return Err(failures.remove(0));
            }
        }
        Ok(self.records.lock().expect("mutex poisoned").get(id).cloned())
    }
}
