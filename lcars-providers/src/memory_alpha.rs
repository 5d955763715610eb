//! Memory Alpha wiki client.
//!
//! Pages are looked up by title via the MediaWiki API; the episode title
//! comes from the catalog. Sidebar parameters are scraped out of the raw
//! wikitext with a tolerant line parser.

use std::sync::Arc;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use lcars_core::{Catalog, CancelToken, Fetcher, MetadataProvider};
use lcars_middleware::{RequestCache, Transport};
use lcars_types::{
    CacheConfig, CacheResource, EpisodeId, LcarsError, MetadataSource, ProviderDefaults,
    ProviderRecord,
};

use crate::common::{finalize, normalize_air_date};

const API_BASE: &str = "https://memory-alpha.fandom.com/api.php";
const WIKI_BASE: &str = "https://memory-alpha.fandom.com/wiki";

static WIKI_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(?:[^|\]]*\|)?([^\]]+)\]\]").expect("static regex"));
static SIDEBAR_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\|\s*([A-Za-z _]+?)\s*=\s*(.+?)\s*$").expect("static regex"));

/// Client for the Memory Alpha wiki.
pub struct MemoryAlphaClient {
    transport: Transport,
    catalog: Arc<dyn Catalog>,
    ttl: Duration,
}

impl MemoryAlphaClient {
    /// A client over `fetcher` with production rate limits and quotas.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        catalog: Arc<dyn Catalog>,
        cache: Option<Arc<RequestCache>>,
    ) -> Self {
        let defaults = ProviderDefaults::production(MetadataSource::MemoryAlpha)
            .expect("memory-alpha has production defaults");
        let mut builder = Transport::builder("memory-alpha", fetcher).with_defaults(&defaults);
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

    /// Wiki page title for an episode: the catalog title with the standard
    /// `(episode)` disambiguation, spaces as underscores.
    #[must_use]
    pub fn page_title(title: &str) -> String {
        format!("{} (episode)", title).replace(' ', "_")
    }

    fn query_url(page: &str) -> String {
        format!(
            "{API_BASE}?action=query&prop=revisions&rvprop=content&rvslots=main&format=json&redirects=1&titles={page}"
        )
    }
}

fn strip_links(raw: &str) -> String {
    WIKI_LINK.replace_all(raw, "$1").trim().to_string()
}

fn split_names(raw: &str) -> Vec<String> {
    strip_links(raw)
        .split(&[',', '&', ';'][..])
        .map(|s| s.trim().trim_start_matches("and ").trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_wikitext(wikitext: &str, record: &mut ProviderRecord) {
    for capture in SIDEBAR_PARAM.captures_iter(wikitext) {
        let key = capture[1].trim().to_ascii_lowercase().replace(' ', "_");
        let value = capture[2].trim();
        match key.as_str() {
            "airdate" | "air_date" => {
                record.air_date = normalize_air_date(&strip_links(value));
            }
            "director" | "directed_by" => record.directors = split_names(value),
            "writer" | "written_by" | "teleplay_by" => {
                for name in split_names(value) {
                    if !record.writers.contains(&name) {
                        record.writers.push(name);
                    }
                }
            }
            "production_number" | "production_code" => {
                record.production_code = Some(strip_links(value)).filter(|v| !v.is_empty());
            }
            "guest_star" | "guest_stars" => record.guest_stars = split_names(value),
            _ => {}
        }
    }

    // First prose paragraph becomes the synopsis; bullet lines under it
    // become plot points.
    let mut synopsis: Option<String> = None;
    let mut plot_points = Vec::new();
    for line in wikitext.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty()
            || trimmed.starts_with('{')
            || trimmed.starts_with('|')
            || trimmed.starts_with('}')
            || trimmed.starts_with('=')
        {
            continue;
        }
        if let Some(point) = trimmed.strip_prefix('*') {
            let point = strip_links(point);
            if !point.is_empty() {
                plot_points.push(point);
            }
            continue;
        }
        if synopsis.is_none() {
            let prose = strip_links(trimmed);
            let prose = prose.replace("'''", "").replace("''", "");
            if !prose.is_empty() {
                synopsis = Some(prose);
            }
        }
    }
    record.synopsis = synopsis;
    record.plot_points = plot_points;
}

#[async_trait]
impl MetadataProvider for MemoryAlphaClient {
    fn name(&self) -> &'static str {
        "memory-alpha"
    }

    fn source(&self) -> MetadataSource {
        MetadataSource::MemoryAlpha
    }

    async fn fetch_episode(
        &self,
        id: &EpisodeId,
        cancel: &CancelToken,
    ) -> Result<Option<ProviderRecord>, LcarsError> {
        // Without a catalog title there is no page to look up.
        let Some(entry) = self.catalog.episode(id) else {
            return Ok(None);
        };
        let page = Self::page_title(&entry.title);
        let url = Self::query_url(&page);
        let body = match self.transport.get(&url, self.ttl, cancel).await {
            Ok(body) => body,
            Err(LcarsError::Http { status: 404, .. }) => return Ok(None),
            Err(err) => return Err(err),
        };
        let value: serde_json::Value =
            serde_json::from_slice(&body).map_err(|e| LcarsError::parse("memory-alpha", e))?;
        let Some(pages) = value
            .get("query")
            .and_then(|q| q.get("pages"))
            .and_then(|p| p.as_object())
        else {
            return Err(LcarsError::parse("memory-alpha", "missing query.pages"));
        };
        // Page ids are dynamic keys; a "-1" key means the title is unknown.
        let Some(page_obj) = pages.values().next() else {
            return Ok(None);
        };
        if page_obj.get("missing").is_some() {
            return Ok(None);
        }
        let Some(wikitext) = page_obj
            .get("revisions")
            .and_then(|r| r.get(0))
            .and_then(|rev| rev.get("slots"))
            .and_then(|s| s.get("main"))
            .and_then(|m| m.get("*"))
            .and_then(|w| w.as_str())
        else {
            return Ok(None);
        };

        let now = chrono::Utc::now();
        let mut record = ProviderRecord::new(id.clone(), MetadataSource::MemoryAlpha, now);
        record.title = Some(entry.title.clone());
        record.memory_alpha_url = Some(format!("{WIKI_BASE}/{page}"));
        record.season = Some(id.season());
        record.episode_number = Some(id.episode());
        parse_wikitext(wikitext, &mut record);

        finalize(&mut record, now);
        Ok(Some(record))
    }
}
