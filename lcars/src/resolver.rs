//! The metadata resolver: provider fan-out plus merge.

use std::sync::Arc;

use async_trait::async_trait;

use lcars_core::{CancelToken, MetadataProvider, merge_records};
use lcars_types::{
    EpisodeId, Job, JobKind, LcarsError, MetadataSource, ProviderRecord, UnifiedMetadata,
};

use crate::core::{Lcars, tag_err};
use crate::queue::JobRunner;

/// How an enrichment attempt concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichCategory {
    /// At least one provider produced data; `metadata` is set.
    Enriched,
    /// Every provider answered, none had data.
    NoData,
    /// No provider is enabled/registered for the request.
    NoProviders,
    /// Every attempted provider failed.
    AllFailed,
}

impl EnrichCategory {
    /// Stable tag for job results and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enriched => "enriched",
            Self::NoData => "no-data",
            Self::NoProviders => "no-providers",
            Self::AllFailed => "all-failed",
        }
    }
}

/// Outcome of one `enrich` call. Failures of a subset of providers are
/// tolerated and reported as warnings alongside the merged record.
#[derive(Debug, Clone)]
pub struct EnrichOutcome {
    /// The merged record, when any provider had data.
    pub metadata: Option<UnifiedMetadata>,
    /// How the attempt concluded.
    pub category: EnrichCategory,
    /// Per-provider failures observed during the fan-out.
    pub errors: Vec<LcarsError>,
}

impl Lcars {
    /// Enrich one episode: query all enabled providers concurrently, merge
    /// the partial records, and return the unified record with provenance.
    ///
    /// Provider start order is not observable and completion order does not
    /// affect the merged record. A subset of providers failing only reduces
    /// coverage; `metadata` is `None` exactly when no provider produced a
    /// record.
    pub async fn enrich(&self, id: &EpisodeId, cancel: &CancelToken) -> EnrichOutcome {
        self.enrich_filtered(id, &[], cancel).await
    }

    /// Parse `raw` as an episode id, then enrich it.
    ///
    /// # Errors
    /// `Validation` when the id is ill-formed.
    pub async fn enrich_str(&self, raw: &str) -> Result<EnrichOutcome, LcarsError> {
        let id = EpisodeId::parse(raw)?;
        Ok(self.enrich(&id, &CancelToken::new()).await)
    }

    /// Enrich restricted to `targets`; an empty slice means all enabled
    /// providers.
    pub async fn enrich_filtered(
        &self,
        id: &EpisodeId,
        targets: &[MetadataSource],
        cancel: &CancelToken,
    ) -> EnrichOutcome {
        let active: Vec<Arc<dyn MetadataProvider>> = self
            .providers
            .iter()
            .filter(|p| p.is_available())
            .filter(|p| targets.is_empty() || targets.contains(&p.source()))
            .cloned()
            .collect();
        if active.is_empty() {
            return EnrichOutcome {
                metadata: None,
                category: EnrichCategory::NoProviders,
                errors: Vec::new(),
            };
        }

        let timeout = self.cfg.provider_timeout;
        let lookups = active.iter().map(|provider| {
            let provider = Arc::clone(provider);
            let cancel = cancel.clone();
            let id = id.clone();
            async move {
                let result = match tokio::time::timeout(
                    timeout,
                    provider.fetch_episode(&id, &cancel),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(LcarsError::timeout(format!(
                        "{} for {id}",
                        provider.name()
                    ))),
                };
                (provider.name(), result)
            }
        });
        let joined = futures::future::join_all(lookups).await;

        let mut records: Vec<ProviderRecord> = Vec::new();
        let mut errors: Vec<LcarsError> = Vec::new();
        for (name, result) in joined {
            match result {
                Ok(Some(record)) => records.push(record),
                // `None` is "no data", not a failure.
                Ok(None) => {}
                Err(err) => {
                    tracing::debug!(
                        target: "lcars::resolver",
                        provider = name,
                        episode = %id,
                        error = %err,
                        "provider attempt failed"
                    );
                    errors.push(tag_err(name, err));
                }
            }
        }

        if records.is_empty() {
            let category = if errors.is_empty() {
                EnrichCategory::NoData
            } else {
                EnrichCategory::AllFailed
            };
            return EnrichOutcome {
                metadata: None,
                category,
                errors,
            };
        }

        let metadata = merge_records(
            id,
            &records,
            self.cfg.strategy,
            &self.scorer,
            self.clock.now_utc(),
            &self.cfg.version,
        );
        let category = if metadata.is_some() {
            EnrichCategory::Enriched
        } else {
            EnrichCategory::NoData
        };
        EnrichOutcome {
            metadata,
            category,
            errors,
        }
    }

    /// Enrich a batch with bounded concurrency, returning a per-episode
    /// outcome instead of an aggregate failure.
    pub async fn enrich_many(
        &self,
        ids: &[EpisodeId],
        concurrency: usize,
    ) -> Vec<(EpisodeId, EnrichOutcome)> {
        use futures::StreamExt as _;
        futures::stream::iter(ids.iter().cloned())
            .map(|id| async move {
                let outcome = self.enrich(&id, &CancelToken::new()).await;
                (id, outcome)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await
    }

    async fn persist(&self, metadata: &UnifiedMetadata) -> Result<(), LcarsError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let bytes =
            serde_json::to_vec(metadata).map_err(|e| LcarsError::Storage(e.to_string()))?;
        store.set(&Self::metadata_key(&metadata.episode), bytes).await
    }
}

#[async_trait]
impl JobRunner for Lcars {
    /// Execute one queue job. Enrich, refresh, and cache-warm jobs all run
    /// the resolver; validate jobs re-derive status from the stored record
    /// without refetching.
    async fn run_job(&self, job: &Job, cancel: &CancelToken) -> Result<(), LcarsError> {
        if cancel.is_cancelled() {
            return Err(LcarsError::Cancelled);
        }
        match job.kind {
            JobKind::Enrich | JobKind::Refresh | JobKind::CacheWarm => {
                let outcome = self
                    .enrich_filtered(&job.episode, &job.target_sources, cancel)
                    .await;
                match outcome.category {
                    EnrichCategory::Enriched => {
                        let metadata = outcome.metadata.as_ref().expect("enriched has metadata");
                        self.persist(metadata).await?;
                        Ok(())
                    }
                    // A provider with no data is a completed job, not a failure.
                    EnrichCategory::NoData => Ok(()),
                    EnrichCategory::NoProviders => Err(LcarsError::NoProviders),
                    EnrichCategory::AllFailed => {
                        Err(LcarsError::AllProvidersFailed(outcome.errors))
                    }
                }
            }
            JobKind::Validate => {
                let Some(store) = &self.store else {
                    return Ok(());
                };
                let Some(raw) = store.get(&Self::metadata_key(&job.episode)).await? else {
                    return Ok(());
                };
                let mut metadata: UnifiedMetadata = serde_json::from_slice(&raw)
                    .map_err(|e| LcarsError::parse("store", e))?;
                metadata.status =
                    lcars_types::EnrichmentStatus::from_confidence(metadata.confidence);
                metadata.is_validated = metadata.confidence >= 0.7;
                metadata.last_updated = self.clock.now_utc();
                self.persist(&metadata).await
            }
        }
    }
}
