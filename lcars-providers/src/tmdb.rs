//! TMDB episode client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use lcars_core::{CancelToken, Fetcher, MetadataProvider};
use lcars_middleware::{RequestCache, Transport};
use lcars_types::{
    CacheConfig, CacheResource, EpisodeId, LcarsError, MetadataSource, ProviderDefaults,
    ProviderRecord,
};

use crate::common::finalize;

/// TMDB series ids for the canonical series tags.
const SERIES_IDS: &[(&str, u64)] = &[
    ("tos", 253),
    ("tng", 655),
    ("ds9", 580),
    ("voy", 1855),
    ("ent", 314),
    ("dis", 67198),
    ("pic", 85949),
    ("low", 85948),
    ("pro", 85950),
    ("snw", 114472),
];

/// Client for The Movie Database. Requires an API key; constructed without
/// one it reports itself unavailable and declines every fetch.
pub struct TmdbClient {
    transport: Transport,
    api_key: Option<String>,
    ttl: Duration,
}

impl TmdbClient {
    /// A client over `fetcher` with production rate limits and quotas.
    /// `api_key` of `None` disables the provider cleanly.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        api_key: Option<String>,
        cache: Option<Arc<RequestCache>>,
    ) -> Self {
        let defaults = ProviderDefaults::production(MetadataSource::Tmdb)
            .expect("tmdb has production defaults");
        let mut builder = Transport::builder("tmdb", fetcher).with_defaults(&defaults);
        if let Some(cache) = cache {
            builder = builder.with_cache(cache);
        }
        Self {
            transport: builder.build(),
            api_key,
            ttl: CacheConfig::default().ttl_for(CacheResource::Episode),
        }
    }

    /// Expert constructor over a pre-composed transport.
    #[must_use]
    pub fn with_transport(transport: Transport, api_key: Option<String>) -> Self {
        Self {
            transport,
            api_key,
            ttl: CacheConfig::default().ttl_for(CacheResource::Episode),
        }
    }

    /// TMDB series id for a series tag, when mapped.
    #[must_use]
    pub fn series_id(series: &str) -> Option<u64> {
        SERIES_IDS
            .iter()
            .find(|(tag, _)| *tag == series)
            .map(|(_, id)| *id)
    }

    fn episode_url(&self, id: &EpisodeId, key: &str) -> Option<String> {
        let series_id = Self::series_id(id.series())?;
        Some(format!(
            "https://api.themoviedb.org/3/tv/{series_id}/season/{}/episode/{}?api_key={key}&append_to_response=external_ids",
            id.season(),
            id.episode(),
        ))
    }
}

#[derive(Deserialize)]
struct TmdbEpisode {
    name: Option<String>,
    overview: Option<String>,
    air_date: Option<String>,
    production_code: Option<String>,
    id: Option<u64>,
    #[serde(default)]
    crew: Vec<TmdbCrew>,
    #[serde(default)]
    guest_stars: Vec<TmdbPerson>,
    external_ids: Option<TmdbExternalIds>,
}

#[derive(Deserialize)]
struct TmdbCrew {
    job: Option<String>,
    name: Option<String>,
}

#[derive(Deserialize)]
struct TmdbPerson {
    name: Option<String>,
}

#[derive(Deserialize)]
struct TmdbExternalIds {
    imdb_id: Option<String>,
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    fn source(&self) -> MetadataSource {
        MetadataSource::Tmdb
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_episode(
        &self,
        id: &EpisodeId,
        cancel: &CancelToken,
    ) -> Result<Option<ProviderRecord>, LcarsError> {
        let Some(key) = self.api_key.as_deref() else {
            return Ok(None);
        };
        let Some(url) = self.episode_url(id, key) else {
            return Ok(None);
        };
        let body = match self.transport.get(&url, self.ttl, cancel).await {
            Ok(body) => body,
            Err(LcarsError::Http { status: 404, .. }) => return Ok(None),
            Err(err) => return Err(err),
        };
        let parsed: TmdbEpisode =
            serde_json::from_slice(&body).map_err(|e| LcarsError::parse("tmdb", e))?;

        let now = chrono::Utc::now();
        let mut record = ProviderRecord::new(id.clone(), MetadataSource::Tmdb, now);
        record.title = parsed.name;
        record.synopsis = parsed.overview;
        record.air_date = parsed.air_date;
        record.production_code = parsed.production_code.filter(|c| !c.is_empty());
        record.tmdb_id = parsed.id;
        record.imdb_id = parsed.external_ids.and_then(|e| e.imdb_id);
        record.season = Some(id.season());
        record.episode_number = Some(id.episode());
        for member in parsed.crew {
            let (Some(job), Some(name)) = (member.job, member.name) else {
                continue;
            };
            match job.as_str() {
                "Director" => record.directors.push(name),
                "Writer" | "Teleplay" | "Story" => record.writers.push(name),
                _ => {}
            }
        }
        record.guest_stars = parsed
            .guest_stars
            .into_iter()
            .filter_map(|p| p.name)
            .collect();

        finalize(&mut record, now);
        Ok(Some(record))
    }
}
