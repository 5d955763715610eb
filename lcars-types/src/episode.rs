//! Canonical episode identifiers and the full episode record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LcarsError;

/// Canonical identifier for a single episode: `<series>_s<season>_e<episode>`.
///
/// The series segment is lowercase alphabetic, the season is decimal, and the
/// episode is rendered with two digits (`ent_s1_e01`). Identifiers order by
/// `(series, season, episode)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EpisodeId {
    series: String,
    season: u32,
    episode: u32,
}

impl EpisodeId {
    /// Parse a canonical episode id, rejecting anything ill-formed.
    ///
    /// # Errors
    /// Returns `LcarsError::Validation` when the input does not match the
    /// `<series>_s<season>_e<episode>` shape.
    pub fn parse(input: &str) -> Result<Self, LcarsError> {
        let mut parts = input.split('_');
        let (Some(series), Some(season), Some(episode), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(bad_id(input));
        };
        if series.is_empty() || !series.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(bad_id(input));
        }
        let season = season
            .strip_prefix('s')
            .and_then(parse_decimal)
            .ok_or_else(|| bad_id(input))?;
        let episode_digits = episode.strip_prefix('e').ok_or_else(|| bad_id(input))?;
        if episode_digits.len() != 2 {
            return Err(bad_id(input));
        }
        let episode = parse_decimal(episode_digits).ok_or_else(|| bad_id(input))?;
        Ok(Self {
            series: series.to_string(),
            season,
            episode,
        })
    }

    /// Build an id from parts. The series segment must already be lowercase.
    ///
    /// # Errors
    /// Returns `LcarsError::Validation` when the series segment is empty or
    /// not lowercase alphabetic, or the episode number needs more than two
    /// digits.
    pub fn new(series: &str, season: u32, episode: u32) -> Result<Self, LcarsError> {
        Self::parse(&format!("{series}_s{season}_e{episode:02}"))
    }

    /// Series segment (e.g. `ent`).
    #[must_use]
    pub fn series(&self) -> &str {
        &self.series
    }

    /// Season number.
    #[must_use]
    pub const fn season(&self) -> u32 {
        self.season
    }

    /// Episode number within the season.
    #[must_use]
    pub const fn episode(&self) -> u32 {
        self.episode
    }

    /// The season-level id this episode belongs to (`ent_s1`).
    #[must_use]
    pub fn season_id(&self) -> SeasonId {
        SeasonId {
            series: self.series.clone(),
            season: self.season,
        }
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_s{}_e{:02}", self.series, self.season, self.episode)
    }
}

impl FromStr for EpisodeId {
    type Err = LcarsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for EpisodeId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EpisodeId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Season-level identifier: `<series>_s<season>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeasonId {
    series: String,
    season: u32,
}

impl SeasonId {
    /// Parse a season-level id.
    ///
    /// # Errors
    /// Returns `LcarsError::Validation` for anything that is not
    /// `<series>_s<season>` with a lowercase alphabetic series segment.
    pub fn parse(input: &str) -> Result<Self, LcarsError> {
        let mut parts = input.split('_');
        let (Some(series), Some(season), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(bad_id(input));
        };
        if series.is_empty() || !series.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(bad_id(input));
        }
        let season = season
            .strip_prefix('s')
            .and_then(parse_decimal)
            .ok_or_else(|| bad_id(input))?;
        Ok(Self {
            series: series.to_string(),
            season,
        })
    }

    /// Series segment.
    #[must_use]
    pub fn series(&self) -> &str {
        &self.series
    }

    /// Season number.
    #[must_use]
    pub const fn season(&self) -> u32 {
        self.season
    }
}

impl fmt::Display for SeasonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_s{}", self.series, self.season)
    }
}

impl Serialize for SeasonId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SeasonId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

fn parse_decimal(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn bad_id(input: &str) -> LcarsError {
    LcarsError::Validation(format!("malformed episode identifier: {input:?}"))
}

/// Kind of relationship between two episodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    /// A shared or recurring character.
    Character,
    /// A shared in-universe event.
    Event,
    /// A continuing storyline arc.
    Storyline,
    /// A direct callback or reference.
    Reference,
}

/// A cross-episode connection annotated with its kind and a description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossConnection {
    /// Target episode id.
    pub episode: EpisodeId,
    /// Target series id segment.
    pub series: String,
    /// Relationship kind.
    pub kind: ConnectionKind,
    /// Human-readable description.
    pub description: String,
}

/// A fully-resolved episode record, as produced by the merger or curated by
/// hand. Optional fields stay `None`/empty when no source supplied them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// Canonical episode id.
    pub id: EpisodeId,
    /// Episode title.
    pub title: String,
    /// Season number (redundant with the id, kept for direct consumption).
    pub season: u32,
    /// Episode number within the season.
    pub episode: u32,
    /// First air date (`YYYY-MM-DD`).
    pub air_date: String,
    /// Short synopsis.
    pub synopsis: String,
    /// Ordered plot points.
    pub plot_points: Vec<String>,
    /// Ordered guest stars.
    pub guest_stars: Vec<String>,
    /// Ordered cross-episode connections.
    pub connections: Vec<CrossConnection>,
    /// Production code, when known.
    pub production_code: Option<String>,
    /// Directors, when known.
    pub directors: Vec<String>,
    /// Writers, when known.
    pub writers: Vec<String>,
    /// TMDB numeric id, when known.
    pub tmdb_id: Option<u64>,
    /// IMDB `tt` id, when known.
    pub imdb_id: Option<String>,
    /// Memory Alpha wiki URL, when known.
    pub memory_alpha_url: Option<String>,
}

impl EpisodeRecord {
    /// An empty record carrying only what the id itself implies.
    #[must_use]
    pub fn empty(id: EpisodeId) -> Self {
        let (season, episode) = (id.season(), id.episode());
        Self {
            id,
            title: String::new(),
            season,
            episode,
            air_date: String::new(),
            synopsis: String::new(),
            plot_points: Vec::new(),
            guest_stars: Vec::new(),
            connections: Vec::new(),
            production_code: None,
            directors: Vec::new(),
            writers: Vec::new(),
            tmdb_id: None,
            imdb_id: None,
            memory_alpha_url: None,
        }
    }
}
