//! STAPI (stapi.co) client: two-step search-then-fetch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use lcars_core::{Catalog, CancelToken, Fetcher, MetadataProvider};
use lcars_middleware::{RequestCache, Transport};
use lcars_types::{
    CacheConfig, CacheResource, EpisodeId, LcarsError, MetadataSource, ProviderDefaults,
    ProviderRecord,
};

use crate::common::finalize;

const API_BASE: &str = "https://stapi.co/api/v1/rest";

/// Client for the Star Trek API.
///
/// The episode lookup is a two-step flow: a season/episode-number search,
/// filtered to the right series via the catalog abbreviation, then a fetch
/// of the full episode by uid.
pub struct StapiClient {
    transport: Transport,
    catalog: Arc<dyn Catalog>,
    ttl: Duration,
}

impl StapiClient {
    /// A client over `fetcher` with production rate limits and quotas.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        catalog: Arc<dyn Catalog>,
        cache: Option<Arc<RequestCache>>,
    ) -> Self {
        let defaults = ProviderDefaults::production(MetadataSource::Stapi)
            .expect("stapi has production defaults");
        let mut builder = Transport::builder("stapi", fetcher).with_defaults(&defaults);
        if let Some(cache) = cache {
            builder = builder.with_cache(cache);
        }
        Self {
            transport: builder.build(),
            catalog,
            ttl: CacheConfig::default().ttl_for(CacheResource::Episode),
        }
    }

    /// Expert constructor over a pre-composed transport.
    #[must_use]
    pub fn with_transport(transport: Transport, catalog: Arc<dyn Catalog>) -> Self {
        Self {
            transport,
            catalog,
            ttl: CacheConfig::default().ttl_for(CacheResource::Episode),
        }
    }

    /// The search URL for one season/episode pair.
    #[must_use]
    pub fn search_url(id: &EpisodeId) -> String {
        format!(
            "{API_BASE}/episode/search?pageSize=50&seasonNumberFrom={season}&seasonNumberTo={season}&episodeNumberFrom={episode}&episodeNumberTo={episode}",
            season = id.season(),
            episode = id.episode(),
        )
    }

    /// The full-episode URL for a search hit.
    #[must_use]
    pub fn episode_url(uid: &str) -> String {
        format!("{API_BASE}/episode?uid={uid}")
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    episodes: Vec<SearchEpisode>,
}

#[derive(Deserialize)]
struct SearchEpisode {
    uid: String,
    series: Option<SeriesHeader>,
}

#[derive(Deserialize)]
struct SeriesHeader {
    abbreviation: Option<String>,
}

#[derive(Deserialize)]
struct EpisodeResponse {
    episode: Option<FullEpisode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FullEpisode {
    title: Option<String>,
    us_air_date: Option<String>,
    production_serial_number: Option<String>,
    season_number: Option<u32>,
    episode_number: Option<u32>,
    #[serde(default)]
    writers: Vec<Person>,
    #[serde(default)]
    directors: Vec<Person>,
}

#[derive(Deserialize)]
struct Person {
    name: Option<String>,
}

#[async_trait]
impl MetadataProvider for StapiClient {
    fn name(&self) -> &'static str {
        "stapi"
    }

    fn source(&self) -> MetadataSource {
        MetadataSource::Stapi
    }

    async fn fetch_episode(
        &self,
        id: &EpisodeId,
        cancel: &CancelToken,
    ) -> Result<Option<ProviderRecord>, LcarsError> {
        let Some(series) = self.catalog.series_entry(id.series()) else {
            return Ok(None);
        };

        let search_body = match self
            .transport
            .get(&Self::search_url(id), self.ttl, cancel)
            .await
        {
            Ok(body) => body,
            Err(LcarsError::Http { status: 404, .. }) => return Ok(None),
            Err(err) => return Err(err),
        };
        let search: SearchResponse =
            serde_json::from_slice(&search_body).map_err(|e| LcarsError::parse("stapi", e))?;
        let Some(hit) = search.episodes.into_iter().find(|e| {
            e.series
                .as_ref()
                .and_then(|s| s.abbreviation.as_deref())
                .is_some_and(|abbr| abbr.eq_ignore_ascii_case(&series.abbreviation))
        }) else {
            return Ok(None);
        };

        let episode_body = match self
            .transport
            .get(&Self::episode_url(&hit.uid), self.ttl, cancel)
            .await
        {
            Ok(body) => body,
            Err(LcarsError::Http { status: 404, .. }) => return Ok(None),
            Err(err) => return Err(err),
        };
        let full: EpisodeResponse =
            serde_json::from_slice(&episode_body).map_err(|e| LcarsError::parse("stapi", e))?;
        let Some(episode) = full.episode else {
            return Ok(None);
        };

        let now = chrono::Utc::now();
        let mut record = ProviderRecord::new(id.clone(), MetadataSource::Stapi, now);
        record.title = episode.title;
        record.air_date = episode.us_air_date;
        record.production_code = episode.production_serial_number.filter(|c| !c.is_empty());
        record.season = episode.season_number.or(Some(id.season()));
        record.episode_number = episode.episode_number.or(Some(id.episode()));
        record.writers = episode.writers.into_iter().filter_map(|p| p.name).collect();
        record.directors = episode
            .directors
            .into_iter()
            .filter_map(|p| p.name)
            .collect();

        finalize(&mut record, now);
        Ok(Some(record))
    }
}
