use lcars_core::{Catalog, EpisodeEntry, Era, SeriesEntry};
use lcars_types::EpisodeId;

struct SeriesDef {
    entry: SeriesEntry,
    episodes_per_season: Vec<u32>,
    titles: Vec<(EpisodeId, String)>,
}

/// Catalog built from static series definitions.
pub struct StaticCatalog {
    eras: Vec<Era>,
    series: Vec<SeriesDef>,
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticCatalog {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            eras: Vec::new(),
            series: Vec::new(),
        }
    }

    /// Add a series with the given episode counts per season. Episodes get
    /// placeholder titles unless overridden with [`with_title`].
    ///
    /// [`with_title`]: StaticCatalog::with_title
    #[must_use]
    pub fn with_series(
        mut self,
        id: &str,
        name: &str,
        abbreviation: &str,
        episodes_per_season: &[u32],
    ) -> Self {
        self.series.push(SeriesDef {
            entry: SeriesEntry {
                id: id.to_string(),
                name: name.to_string(),
                abbreviation: abbreviation.to_string(),
                seasons: episodes_per_season.len() as u32,
            },
            episodes_per_season: episodes_per_season.to_vec(),
            titles: Vec::new(),
        });
        self
    }

    /// Override the title of one episode.
    ///
    /// # Panics
    /// Panics when the episode's series has not been added.
    #[must_use]
    pub fn with_title(mut self, id: &str, title: &str) -> Self {
        let id = EpisodeId::parse(id).expect("test catalog id must be canonical");
        let series = self
            .series
            .iter_mut()
            .find(|s| s.entry.id == id.series())
            .expect("series must be registered before titles");
        series.titles.push((id, title.to_string()));
        self
    }

    /// Add an era spanning the given series ids.
    #[must_use]
    pub fn with_era(mut self, id: &str, name: &str, series: &[&str]) -> Self {
        self.eras.push(Era {
            id: id.to_string(),
            name: name.to_string(),
            series: series.iter().map(ToString::to_string).collect(),
        });
        self
    }
}

impl Catalog for StaticCatalog {
    fn eras(&self) -> Vec<Era> {
        self.eras.clone()
    }

    fn series(&self) -> Vec<SeriesEntry> {
        self.series.iter().map(|s| s.entry.clone()).collect()
    }

    fn episodes_of_season(&self, series: &str, season: u32) -> Vec<EpisodeEntry> {
        let Some(def) = self.series.iter().find(|s| s.entry.id == series) else {
            return Vec::new();
        };
        let Some(count) = season
            .checked_sub(1)
            .and_then(|idx| def.episodes_per_season.get(idx as usize))
        else {
            return Vec::new();
        };
        (1..=*count)
            .map(|n| {
                let id = EpisodeId::new(series, season, n).expect("generated id is canonical");
                let title = def
                    .titles
                    .iter()
                    .find(|(tid, _)| tid == &id)
                    .map_or_else(|| format!("Episode {n}"), |(_, t)| t.clone());
                EpisodeEntry { id, title }
            })
            .collect()
    }
}
