//! Hand-curated records served from the key/value store.

use std::sync::Arc;

use async_trait::async_trait;

use lcars_core::{CancelToken, KvStore, MetadataProvider};
use lcars_types::{EpisodeId, LcarsError, MetadataSource, ProviderRecord};

use crate::common::finalize;

/// Prefix under which curated records live in the store.
const KEY_PREFIX: &str = "manual_metadata_";

/// Provider backed by curated records persisted under
/// `manual_metadata_<episode-id>` keys.
pub struct ManualProvider {
    store: Arc<dyn KvStore>,
}

impl ManualProvider {
    /// A provider over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// The storage key for an episode's curated record.
    #[must_use]
    pub fn key_for(id: &EpisodeId) -> String {
        format!("{KEY_PREFIX}{id}")
    }
}

#[async_trait]
impl MetadataProvider for ManualProvider {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn source(&self) -> MetadataSource {
        MetadataSource::Manual
    }

    async fn fetch_episode(
        &self,
        id: &EpisodeId,
        _cancel: &CancelToken,
    ) -> Result<Option<ProviderRecord>, LcarsError> {
        let Some(raw) = self.store.get(&Self::key_for(id)).await? else {
            return Ok(None);
        };
        let mut record: ProviderRecord =
            serde_json::from_slice(&raw).map_err(|e| LcarsError::parse("manual", e))?;
        if record.episode != *id {
            return Err(LcarsError::parse(
                "manual",
                format!("stored record is for {}, requested {id}", record.episode),
            ));
        }
        record.source = MetadataSource::Manual;
        if record.validations.is_empty() {
            let fetched_at = record.fetched_at;
            finalize(&mut record, fetched_at);
        }
        Ok(Some(record))
    }
}
