//! Persisted migration state and transaction records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Granularity of the persisted progress list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressVersion {
    /// One id per completed season (`ent_s1`).
    #[default]
    SeasonLevel,
    /// One id per watched episode (`ent_s1_e01`).
    EpisodeLevel,
}

impl ProgressVersion {
    /// Stable kebab-case identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SeasonLevel => "season-level",
            Self::EpisodeLevel => "episode-level",
        }
    }
}

/// One append-only history entry recorded per committed migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Representation before the migration.
    pub from: ProgressVersion,
    /// Representation after the migration.
    pub to: ProgressVersion,
    /// When the migration committed.
    pub at: DateTime<Utc>,
    /// Number of items in the resulting progress list.
    pub item_count: usize,
}

/// An open migration transaction, persisted until commit or abort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationTransaction {
    /// Unique transaction id.
    pub id: u64,
    /// When the transaction opened.
    pub started_at: DateTime<Utc>,
    /// Snapshot of the progress list before any rewrite.
    pub snapshot: Vec<String>,
    /// Representation the transaction is migrating toward.
    pub target: ProgressVersion,
    /// Set on commit; an aborted transaction stays `false` for manual retry.
    pub completed: bool,
}

/// The persisted migration-state singleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MigrationState {
    /// Current representation of the progress list.
    pub current_version: ProgressVersion,
    /// When the last migration committed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_migrated: Option<DateTime<Utc>>,
    /// Append-only migration log.
    #[serde(default)]
    pub history: Vec<MigrationRecord>,
    /// True exactly when the most recent successful forward migration's
    /// snapshot is still retained.
    #[serde(default)]
    pub rollback_available: bool,
    /// Snapshot retained from the most recent successful forward migration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback_snapshot: Option<Vec<String>>,
    /// Id of an open (uncommitted) transaction, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_transaction: Option<u64>,
}

/// Result object every migration call returns; migrations never raise to
/// their caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MigrationReport {
    /// Whether the migration committed.
    pub success: bool,
    /// The resulting progress list.
    pub progress: Vec<String>,
    /// Items rewritten between representations.
    pub converted: usize,
    /// Items preserved verbatim.
    pub preserved: usize,
    /// Items dropped (lossy rollback of partial seasons).
    pub dropped: usize,
    /// Per-item conversion errors; the offending input is preserved verbatim.
    pub errors: Vec<String>,
    /// Non-fatal observations (unknown seasons, lossy coalescing).
    pub warnings: Vec<String>,
    /// Whether the state left behind can still be rolled back.
    pub can_rollback: bool,
}
