//! Unified (merged) metadata and the merge vocabulary.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::episode::{CrossConnection, EpisodeId, EpisodeRecord};
use crate::provider::{FieldValidation, MetadataSource};

/// The fields subject to scoring, merging, and conflict resolution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum EpisodeField {
    /// Episode title.
    Title,
    /// First air date.
    AirDate,
    /// Season number.
    Season,
    /// Episode number.
    Episode,
    /// Synopsis text.
    Synopsis,
    /// Plot points.
    PlotPoints,
    /// Guest stars.
    GuestStars,
    /// Directors.
    Directors,
    /// Writers.
    Writers,
    /// Production code.
    ProductionCode,
    /// TMDB numeric id.
    TmdbId,
    /// IMDB `tt` id.
    ImdbId,
    /// Memory Alpha wiki URL.
    MemoryAlphaUrl,
    /// Cross-episode connections.
    Connections,
}

impl EpisodeField {
    /// Every mergeable field, in canonical order.
    pub const ALL: [Self; 14] = [
        Self::Title,
        Self::AirDate,
        Self::Season,
        Self::Episode,
        Self::Synopsis,
        Self::PlotPoints,
        Self::GuestStars,
        Self::Directors,
        Self::Writers,
        Self::ProductionCode,
        Self::TmdbId,
        Self::ImdbId,
        Self::MemoryAlphaUrl,
        Self::Connections,
    ];

    /// Default completeness importance weight.
    #[must_use]
    pub const fn importance(self) -> f64 {
        match self {
            Self::Title | Self::AirDate | Self::Season | Self::Episode => 1.0,
            Self::Synopsis => 0.9,
            Self::Writers | Self::Directors | Self::PlotPoints => 0.8,
            Self::ProductionCode | Self::GuestStars => 0.7,
            Self::TmdbId | Self::ImdbId | Self::MemoryAlphaUrl => 0.6,
            Self::Connections => 0.5,
        }
    }

    /// Whether the field counts toward the unified confidence score.
    ///
    /// The expected set is the high-importance core (weight >= 0.8): title,
    /// air date, season, episode, synopsis, plot points, directors, writers.
    #[must_use]
    pub const fn is_expected(self) -> bool {
        self.importance() >= 0.8
    }

    /// Whether the field holds a sequence that the merge-with-priority
    /// strategy unions rather than picks.
    #[must_use]
    pub const fn is_list(self) -> bool {
        matches!(
            self,
            Self::PlotPoints | Self::GuestStars | Self::Directors | Self::Writers
        )
    }

    /// Stable camel-case identifier matching the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::AirDate => "airDate",
            Self::Season => "season",
            Self::Episode => "episode",
            Self::Synopsis => "synopsis",
            Self::PlotPoints => "plotPoints",
            Self::GuestStars => "guestStars",
            Self::Directors => "directors",
            Self::Writers => "writers",
            Self::ProductionCode => "productionCode",
            Self::TmdbId => "tmdbId",
            Self::ImdbId => "imdbId",
            Self::MemoryAlphaUrl => "memoryAlphaUrl",
            Self::Connections => "connections",
        }
    }
}

impl fmt::Display for EpisodeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field value as seen by the merger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Free text (titles, dates, synopses, external string ids, URLs).
    Text(String),
    /// Numeric value (season/episode numbers, TMDB id).
    Number(u64),
    /// Ordered list of strings.
    List(Vec<String>),
    /// Ordered cross-episode connections.
    Connections(Vec<CrossConnection>),
}

/// Strategy for resolving a field when providers disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum MergeStrategy {
    /// Choose the value from the provider whose record scores highest.
    #[default]
    HighestQuality,
    /// Choose the most recently fetched value.
    LatestWins,
    /// Choose by the fixed source-priority ordering.
    SourcePriority,
    /// Union list-valued fields in priority order; scalars fall back to
    /// source priority.
    MergeWithPriority,
}

impl MergeStrategy {
    /// Stable kebab-case identifier recorded on conflict decisions.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HighestQuality => "highest-quality",
            Self::LatestWins => "latest-wins",
            Self::SourcePriority => "source-priority",
            Self::MergeWithPriority => "merge-with-priority",
        }
    }
}

/// Enrichment status derived deterministically from the confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentStatus {
    /// No usable data yet, but some coverage short of the partial threshold.
    Pending,
    /// Coverage of at least half the expected fields.
    Partial,
    /// Coverage of at least 90% of the expected fields.
    Complete,
    /// Zero coverage.
    Failed,
}

impl EnrichmentStatus {
    /// Derive the status from a confidence score in [0, 1].
    #[must_use]
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.9 {
            Self::Complete
        } else if confidence >= 0.5 {
            Self::Partial
        } else if confidence == 0.0 {
            Self::Failed
        } else {
            Self::Pending
        }
    }
}

/// One competing value in a conflict, with its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictValue {
    /// The value a provider supplied.
    pub value: FieldValue,
    /// The provider that supplied it.
    pub source: MetadataSource,
}

/// Record of a conflict the merger resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictDecision {
    /// The contested field.
    pub field: EpisodeField,
    /// All distinct competing values with their sources.
    pub values: Vec<ConflictValue>,
    /// The value the strategy selected (or synthesized, for list unions).
    pub resolved: FieldValue,
    /// The strategy that made the call.
    pub strategy: MergeStrategy,
}

/// A merged metadata record with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedMetadata {
    /// The episode this record describes.
    pub episode: EpisodeId,
    /// The resolved record.
    pub record: EpisodeRecord,
    /// Primary source: the provider that contributed the plurality of
    /// chosen values (ties broken by source priority).
    pub data_source: MetadataSource,
    /// When the merge ran.
    pub last_updated: DateTime<Utc>,
    /// Whether confidence cleared the validation threshold (0.7).
    pub is_validated: bool,
    /// Fraction of expected fields with a valid resolved value, in [0, 1].
    pub confidence: f64,
    /// Schema/merge version string.
    pub version: String,
    /// Status derived from the confidence score.
    pub status: EnrichmentStatus,
    /// Per-field provenance and validation.
    pub validations: BTreeMap<EpisodeField, FieldValidation>,
    /// Conflicts encountered during the merge, in canonical field order.
    pub conflicts: Vec<ConflictDecision>,
}
