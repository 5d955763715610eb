//! Provider source tags and the partial records providers emit.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::episode::{CrossConnection, EpisodeId};
use crate::unified::{EpisodeField, FieldValue};

/// External metadata source tags.
///
/// `priority_rank` defines the fixed ordering used by the source-priority
/// merge strategy: memory-alpha > tmdb > imdb > trekcore > stapi >
/// startrek-com > manual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum MetadataSource {
    /// The Memory Alpha wiki.
    MemoryAlpha,
    /// The Movie Database.
    Tmdb,
    /// IMDB (reached indirectly via external ids).
    Imdb,
    /// Hand-curated records.
    Manual,
    /// TrekCore episode pages.
    #[serde(rename = "trekcore")]
    TrekCore,
    /// The Star Trek API (stapi.co).
    Stapi,
    /// startrek.com editorial data.
    #[serde(rename = "startrek-com")]
    StarTrekCom,
}

impl MetadataSource {
    /// Stable, kebab-case identifier for logs and persisted records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MemoryAlpha => "memory-alpha",
            Self::Tmdb => "tmdb",
            Self::Imdb => "imdb",
            Self::Manual => "manual",
            Self::TrekCore => "trekcore",
            Self::Stapi => "stapi",
            Self::StarTrekCom => "startrek-com",
        }
    }

    /// Fixed priority rank; lower wins.
    #[must_use]
    pub const fn priority_rank(self) -> u8 {
        match self {
            Self::MemoryAlpha => 0,
            Self::Tmdb => 1,
            Self::Imdb => 2,
            Self::TrekCore => 3,
            Self::Stapi => 4,
            Self::StarTrekCom => 5,
            Self::Manual => 6,
        }
    }
}

impl fmt::Display for MetadataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observed reliability figures a provider advertises about itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProviderReliability {
    /// Fraction of requests expected to reach the provider, in [0, 1].
    pub uptime: f64,
    /// Fraction of supplied values expected to be accurate, in [0, 1].
    pub accuracy: f64,
    /// Typical round-trip latency in milliseconds.
    pub latency_ms: u32,
}

/// Per-field validation outcome attached to provider and unified records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValidation {
    /// Whether the value passed validation.
    pub is_valid: bool,
    /// Source that supplied the value.
    pub source: MetadataSource,
    /// When validation ran.
    pub validated_at: DateTime<Utc>,
    /// Validation failure description, when invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FieldValidation {
    /// A passing validation entry.
    #[must_use]
    pub const fn valid(source: MetadataSource, validated_at: DateTime<Utc>) -> Self {
        Self {
            is_valid: true,
            source,
            validated_at,
            error: None,
        }
    }

    /// A failing validation entry with a reason.
    #[must_use]
    pub fn invalid(source: MetadataSource, validated_at: DateTime<Utc>, error: String) -> Self {
        Self {
            is_valid: false,
            source,
            validated_at,
            error: Some(error),
        }
    }
}

/// A partial episode record as parsed from a single provider response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRecord {
    /// The episode this record describes.
    pub episode: EpisodeId,
    /// Source the record came from.
    pub source: MetadataSource,
    /// When the payload was fetched (UTC).
    pub fetched_at: DateTime<Utc>,
    /// Episode title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// First air date (`YYYY-MM-DD`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_date: Option<String>,
    /// Season number reported by the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    /// Episode number reported by the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_number: Option<u32>,
    /// Synopsis text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    /// Ordered plot points.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plot_points: Vec<String>,
    /// Ordered guest stars.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub guest_stars: Vec<String>,
    /// Directors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directors: Vec<String>,
    /// Writers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub writers: Vec<String>,
    /// Production code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_code: Option<String>,
    /// TMDB numeric id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<u64>,
    /// IMDB `tt` id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    /// Memory Alpha wiki URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_alpha_url: Option<String>,
    /// Cross-episode connections.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<CrossConnection>,
    /// Per-field validation entries stamped by the provider client.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub validations: BTreeMap<EpisodeField, FieldValidation>,
}

impl ProviderRecord {
    /// An empty partial record for `episode` from `source`.
    #[must_use]
    pub fn new(episode: EpisodeId, source: MetadataSource, fetched_at: DateTime<Utc>) -> Self {
        Self {
            episode,
            source,
            fetched_at,
            title: None,
            air_date: None,
            season: None,
            episode_number: None,
            synopsis: None,
            plot_points: Vec::new(),
            guest_stars: Vec::new(),
            directors: Vec::new(),
            writers: Vec::new(),
            production_code: None,
            tmdb_id: None,
            imdb_id: None,
            memory_alpha_url: None,
            connections: Vec::new(),
            validations: BTreeMap::new(),
        }
    }

    /// Generic accessor used by the merger; `None` when the field is absent
    /// or empty.
    #[must_use]
    pub fn field(&self, field: EpisodeField) -> Option<FieldValue> {
        fn text(v: &Option<String>) -> Option<FieldValue> {
            v.as_deref()
                .filter(|s| !s.is_empty())
                .map(|s| FieldValue::Text(s.to_string()))
        }
        fn list(v: &[String]) -> Option<FieldValue> {
            (!v.is_empty()).then(|| FieldValue::List(v.to_vec()))
        }
        match field {
            EpisodeField::Title => text(&self.title),
            EpisodeField::AirDate => text(&self.air_date),
            EpisodeField::Season => self.season.map(|n| FieldValue::Number(u64::from(n))),
            EpisodeField::Episode => self.episode_number.map(|n| FieldValue::Number(u64::from(n))),
            EpisodeField::Synopsis => text(&self.synopsis),
            EpisodeField::PlotPoints => list(&self.plot_points),
            EpisodeField::GuestStars => list(&self.guest_stars),
            EpisodeField::Directors => list(&self.directors),
            EpisodeField::Writers => list(&self.writers),
            EpisodeField::ProductionCode => text(&self.production_code),
            EpisodeField::TmdbId => self.tmdb_id.map(FieldValue::Number),
            EpisodeField::ImdbId => text(&self.imdb_id),
            EpisodeField::MemoryAlphaUrl => text(&self.memory_alpha_url),
            EpisodeField::Connections => {
                (!self.connections.is_empty())
                    .then(|| FieldValue::Connections(self.connections.clone()))
            }
        }
    }

    /// Whether the field carries a value the provider's own validation
    /// considers usable. Fields without a validation entry count as valid.
    #[must_use]
    pub fn field_is_valid(&self, field: EpisodeField) -> bool {
        self.validations.get(&field).is_none_or(|v| v.is_valid)
    }

    /// Fields present and non-empty in this record.
    #[must_use]
    pub fn present_fields(&self) -> Vec<EpisodeField> {
        EpisodeField::ALL
            .iter()
            .copied()
            .filter(|f| self.field(*f).is_some())
            .collect()
    }
}
