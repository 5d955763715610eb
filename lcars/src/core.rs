use std::fmt;
use std::sync::Arc;

use lcars_core::{Clock, KvStore, MetadataProvider, QualityScorer, SystemClock};
use lcars_types::{EventSink, LcarsError, MergeStrategy, NullSink, QualityWeights, ResolverConfig};

/// Orchestrator that fans episode lookups out across registered providers
/// and merges the results.
pub struct Lcars {
    pub(crate) providers: Vec<Arc<dyn MetadataProvider>>,
    pub(crate) cfg: ResolverConfig,
    pub(crate) scorer: QualityScorer,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) sink: Arc<dyn EventSink>,
    pub(crate) store: Option<Arc<dyn KvStore>>,
}

impl fmt::Debug for Lcars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lcars")
            .field("providers", &self.providers.len())
            .field("cfg", &self.cfg)
            .field("scorer", &self.scorer)
            .field("store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for constructing an [`Lcars`] orchestrator.
pub struct LcarsBuilder {
    providers: Vec<Arc<dyn MetadataProvider>>,
    cfg: ResolverConfig,
    weights: QualityWeights,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
    store: Option<Arc<dyn KvStore>>,
}

impl Default for LcarsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LcarsBuilder {
    /// A builder with defaults: no providers, highest-quality merging, the
    /// system clock, and a discarding event sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: vec![],
            cfg: ResolverConfig::default(),
            weights: QualityWeights::default(),
            clock: Arc::new(SystemClock),
            sink: Arc::new(NullSink),
            store: None,
        }
    }

    /// Register a provider client.
    ///
    /// Registration order only matters as a tie-breaker nowhere: provider
    /// starts are unordered and the merge is order-independent. Each source
    /// tag may be registered at most once; `build` rejects duplicates.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn MetadataProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Select the conflict-resolution strategy.
    #[must_use]
    pub const fn merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.cfg.strategy = strategy;
        self
    }

    /// Set the per-provider time budget inside a fan-out.
    #[must_use]
    pub const fn provider_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.cfg.provider_timeout = timeout;
        self
    }

    /// Override the version string stamped onto unified records.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.cfg.version = version.into();
        self
    }

    /// Override the quality-score weights.
    #[must_use]
    pub const fn quality_weights(mut self, weights: QualityWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Inject a wall clock (tests use a manual one).
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register the event sink components emit into.
    #[must_use]
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Attach a key/value store; enrichment results are persisted under
    /// `metadata_<episode-id>` keys when present.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn KvStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the orchestrator.
    ///
    /// # Errors
    /// - `Validation` if no providers were registered.
    /// - `Validation` if two providers share a source tag.
    pub fn build(self) -> Result<Lcars, LcarsError> {
        if self.providers.is_empty() {
            return Err(LcarsError::Validation(
                "no providers registered; add at least one via with_provider(...)".to_string(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for provider in &self.providers {
            if !seen.insert(provider.source()) {
                return Err(LcarsError::Validation(format!(
                    "duplicate provider for source {}",
                    provider.source()
                )));
            }
        }
        Ok(Lcars {
            providers: self.providers,
            cfg: self.cfg,
            scorer: QualityScorer::new(self.weights),
            clock: self.clock,
            sink: self.sink,
            store: self.store,
        })
    }
}

impl Lcars {
    /// Start building a new orchestrator.
    #[must_use]
    pub fn builder() -> LcarsBuilder {
        LcarsBuilder::new()
    }

    /// The registered providers.
    #[must_use]
    pub fn providers(&self) -> &[Arc<dyn MetadataProvider>] {
        &self.providers
    }

    /// The storage key unified metadata is persisted under.
    #[must_use]
    pub fn metadata_key(id: &lcars_types::EpisodeId) -> String {
        format!("metadata_{id}")
    }
}

/// Tag an untagged error with the provider that produced it.
pub(crate) fn tag_err(provider: &str, err: LcarsError) -> LcarsError {
    match err {
        e @ (LcarsError::Provider { .. }
        | LcarsError::Parse { .. }
        | LcarsError::NotFound { .. }
        | LcarsError::Timeout { .. }
        | LcarsError::Http { .. }
        | LcarsError::Exhausted { .. }
        | LcarsError::QuotaExceeded { .. }
        | LcarsError::Cancelled
        | LcarsError::AllProvidersFailed(_)) => e,
        other => LcarsError::Provider {
            provider: provider.to_string(),
            msg: other.to_string(),
        },
    }
}
