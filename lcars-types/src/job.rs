//! Background job records and queue progress reporting.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::episode::EpisodeId;
use crate::provider::MetadataSource;

/// Queue-assigned job identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// What a job does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    /// Produce a unified metadata record.
    Enrich,
    /// Speculative enrichment driven by the cache warmer.
    CacheWarm,
    /// Re-fetch an episode that already has metadata.
    Refresh,
    /// Re-validate an existing unified record without refetching.
    Validate,
}

impl JobKind {
    /// Stable kebab-case identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enrich => "enrich",
            Self::CacheWarm => "cache-warm",
            Self::Refresh => "refresh",
            Self::Validate => "validate",
        }
    }
}

/// Job lifecycle states. Terminal states are sticky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    /// Waiting for dispatch.
    Pending,
    /// Currently running.
    InProgress,
    /// Finished successfully.
    Completed,
    /// Exhausted retries or failed permanently.
    Failed,
    /// Cancelled before or during execution.
    Cancelled,
}

impl JobStatus {
    /// Whether the status is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Request to enqueue a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Target episode.
    pub episode: EpisodeId,
    /// Job kind.
    pub kind: JobKind,
    /// Priority; higher dispatches sooner.
    pub priority: i32,
    /// Retry budget override; queue default when `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    /// Warming strategy that produced the job, for cache-warm jobs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<WarmingStrategy>,
    /// Restrict enrichment to these sources; empty means all enabled
    /// providers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_sources: Vec<MetadataSource>,
}

impl JobSpec {
    /// A user-initiated enrichment job.
    #[must_use]
    pub const fn enrich(episode: EpisodeId, priority: i32) -> Self {
        Self {
            episode,
            kind: JobKind::Enrich,
            priority,
            max_retries: None,
            strategy: None,
            target_sources: Vec::new(),
        }
    }

    /// A speculative cache-warm job.
    #[must_use]
    pub const fn cache_warm(episode: EpisodeId, priority: i32, strategy: WarmingStrategy) -> Self {
        Self {
            episode,
            kind: JobKind::CacheWarm,
            priority,
            max_retries: None,
            strategy: Some(strategy),
            target_sources: Vec::new(),
        }
    }
}

/// A job owned by the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Queue-assigned id.
    pub id: JobId,
    /// Target episode.
    pub episode: EpisodeId,
    /// Job kind.
    pub kind: JobKind,
    /// Priority; higher dispatches sooner.
    pub priority: i32,
    /// Current lifecycle state.
    pub status: JobStatus,
    /// Retries consumed so far.
    pub retry_count: u32,
    /// Retry budget.
    pub max_retries: u32,
    /// When the job was enqueued.
    pub created_at: DateTime<Utc>,
    /// Last state change.
    pub updated_at: DateTime<Utc>,
    /// Earliest dispatch time (moved forward by retry backoff).
    pub scheduled_at: DateTime<Utc>,
    /// Last failure, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Warming strategy that produced the job, for cache-warm jobs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<WarmingStrategy>,
    /// Source restriction; empty means all enabled providers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_sources: Vec<MetadataSource>,
}

/// Aggregated queue counters with an ETA from a rolling duration average.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QueueProgress {
    /// Every job the queue knows about (live and recent history).
    pub total: usize,
    /// Jobs waiting for dispatch.
    pub pending: usize,
    /// Jobs currently running.
    pub running: usize,
    /// Completed jobs.
    pub completed: usize,
    /// Terminally failed jobs.
    pub failed: usize,
    /// Cancelled jobs.
    pub cancelled: usize,
    /// Whether dispatch is paused.
    pub paused: bool,
    /// Estimated completion time for the remaining work, when computable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<DateTime<Utc>>,
}

/// Cache-warming strategies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum WarmingStrategy {
    /// Series and season premieres.
    PopularEpisodes,
    /// The next few episodes after the most recently watched one.
    RecentlyWatched,
    /// The next few episodes in series order.
    SequentialPrediction,
    /// The leading episodes of an era.
    EraBased,
    /// An explicit id list (new content).
    NewContent,
    /// A single manually requested episode.
    Manual,
}

impl WarmingStrategy {
    /// Stable kebab-case identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PopularEpisodes => "popular-episodes",
            Self::RecentlyWatched => "recently-watched",
            Self::SequentialPrediction => "sequential-prediction",
            Self::EraBased => "era-based",
            Self::NewContent => "new-content",
            Self::Manual => "manual",
        }
    }

    /// Priority adjustment relative to the warmer's default priority.
    #[must_use]
    pub const fn priority_delta(self) -> i32 {
        match self {
            Self::NewContent => 2,
            Self::Manual | Self::PopularEpisodes => 1,
            Self::RecentlyWatched | Self::SequentialPrediction => 0,
            Self::EraBased => -1,
        }
    }
}

/// Counters the cache warmer maintains across waves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WarmingStats {
    /// Jobs enqueued by the warmer.
    pub total: u64,
    /// Warm jobs that completed.
    pub successful: u64,
    /// Warm jobs that failed.
    pub failed: u64,
    /// Rolling average job duration in milliseconds.
    pub avg_duration_ms: f64,
    /// Fraction of warm jobs that were already served from cache.
    pub cache_hit_rate: f64,
    /// Enqueued counts per strategy.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub per_strategy: BTreeMap<WarmingStrategy, u64>,
    /// When the last wave ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_warmed_at: Option<DateTime<Utc>>,
}
