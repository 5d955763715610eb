//! Read-only catalog contract.
//!
//! The catalog is the authoritative list of eras, series, and episodes. The
//! enrichment core never mutates it; the cache warmer and the migration
//! engine read it to expand seasons and predict lookups.

use lcars_types::EpisodeId;

/// A broadcast era grouping several series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Era {
    /// Stable era id (e.g. `enterprise-era`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Series ids in in-universe order.
    pub series: Vec<String>,
}

/// A series known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesEntry {
    /// Lowercase series id used in episode identifiers (`ent`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Uppercase abbreviation used by some providers (`ENT`).
    pub abbreviation: String,
    /// Number of seasons.
    pub seasons: u32,
}

/// A single episode as the catalog knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeEntry {
    /// Canonical episode id.
    pub id: EpisodeId,
    /// Episode title.
    pub title: String,
}

/// Read-only access to the curated catalog.
pub trait Catalog: Send + Sync {
    /// All eras, in chronological order.
    fn eras(&self) -> Vec<Era>;

    /// All series.
    fn series(&self) -> Vec<SeriesEntry>;

    /// A single series by id.
    fn series_entry(&self, series: &str) -> Option<SeriesEntry> {
        self.series().into_iter().find(|s| s.id == series)
    }

    /// Episodes of one season, in episode order. Empty when the catalog has
    /// no data for the series/season.
    fn episodes_of_season(&self, series: &str, season: u32) -> Vec<EpisodeEntry>;

    /// Number of seasons for a series; 0 when unknown.
    fn seasons_of_series(&self, series: &str) -> u32 {
        self.series_entry(series).map_or(0, |s| s.seasons)
    }

    /// Look up one episode.
    fn episode(&self, id: &EpisodeId) -> Option<EpisodeEntry> {
        self.episodes_of_season(id.series(), id.season())
            .into_iter()
            .find(|e| &e.id == id)
    }

    /// The episodes following `id` in series order (continuing into later
    /// seasons), up to `count` entries.
    fn episodes_after(&self, id: &EpisodeId, count: usize) -> Vec<EpisodeEntry> {
        let mut out = Vec::with_capacity(count);
        let mut season = id.season();
        let mut after = Some(id.episode());
        let total_seasons = self.seasons_of_series(id.series());
        while out.len() < count && season <= total_seasons.max(id.season()) {
            let episodes = self.episodes_of_season(id.series(), season);
            if episodes.is_empty() {
                break;
            }
            for entry in episodes {
                if after.is_none_or(|n| entry.id.episode() > n) && out.len() < count {
                    out.push(entry);
                }
            }
            season += 1;
            after = None;
        }
        out
    }
}
