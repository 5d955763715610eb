//! TrekCore episode-page scraper.

use std::sync::Arc;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use lcars_core::sanitize::strip_tags;
use lcars_core::{CancelToken, Fetcher, MetadataProvider};
use lcars_middleware::{RequestCache, Transport};
use lcars_types::{
    CacheConfig, CacheResource, EpisodeId, LcarsError, MetadataSource, ProviderDefaults,
    ProviderRecord,
};

use crate::common::finalize;

static PAGE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title>(.*?)</title>").expect("static regex"));
static META_DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<meta\s+name="description"\s+content="([^"]*)""#).expect("static regex")
});

/// Client for the per-series TrekCore episode pages.
pub struct TrekCoreClient {
    transport: Transport,
    ttl: Duration,
}

impl TrekCoreClient {
    /// A client over `fetcher` with production rate limits and quotas.
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>, cache: Option<Arc<RequestCache>>) -> Self {
        let defaults = ProviderDefaults::production(MetadataSource::TrekCore)
            .expect("trekcore has production defaults");
        let mut builder = Transport::builder("trekcore", fetcher).with_defaults(&defaults);
        if let Some(cache) = cache {
            builder = builder.with_cache(cache);
        }
        Self {
            transport: builder.build(),
            ttl: CacheConfig::default().ttl_for(CacheResource::Episode),
        }
    }

    /// Expert constructor over a pre-composed transport.
    #[must_use]
    pub fn with_transport(transport: Transport) -> Self {
        Self {
            transport,
            ttl: CacheConfig::default().ttl_for(CacheResource::Episode),
        }
    }

    /// The per-series episode-page URL:
    /// `https://<series>.trekcore.com/episodes/season<N>/<series><N>x<EE>.php`.
    #[must_use]
    pub fn episode_url(id: &EpisodeId) -> String {
        format!(
            "https://{series}.trekcore.com/episodes/season{season}/{series}{season}x{episode:02}.php",
            series = id.series(),
            season = id.season(),
            episode = id.episode(),
        )
    }
}

#[async_trait]
impl MetadataProvider for TrekCoreClient {
    fn name(&self) -> &'static str {
        "trekcore"
    }

    fn source(&self) -> MetadataSource {
        MetadataSource::TrekCore
    }

    async fn fetch_episode(
        &self,
        id: &EpisodeId,
        cancel: &CancelToken,
    ) -> Result<Option<ProviderRecord>, LcarsError> {
        let url = Self::episode_url(id);
        let body = match self.transport.get(&url, self.ttl, cancel).await {
            Ok(body) => body,
            Err(LcarsError::Http { status: 404, .. }) => return Ok(None),
            Err(err) => return Err(err),
        };
        let html = String::from_utf8_lossy(&body);

        let now = chrono::Utc::now();
        let mut record = ProviderRecord::new(id.clone(), MetadataSource::TrekCore, now);
        record.season = Some(id.season());
        record.episode_number = Some(id.episode());
        if let Some(cap) = PAGE_TITLE.captures(&html) {
            // Page titles carry a " - TrekCore" style suffix.
            let raw = strip_tags(&cap[1]);
            let title = raw.split(" - ").next().unwrap_or(&raw).trim().to_string();
            record.title = Some(title).filter(|t| !t.is_empty());
        }
        if let Some(cap) = META_DESCRIPTION.captures(&html) {
            let text = strip_tags(&cap[1]);
            record.synopsis = Some(text).filter(|t| !t.is_empty());
        }
        if record.title.is_none() && record.synopsis.is_none() {
            return Ok(None);
        }

        finalize(&mut record, now);
        Ok(Some(record))
    }
}
