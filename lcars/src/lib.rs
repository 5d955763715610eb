//! Lcars enriches a curated episodic catalog with metadata from multiple
//! external providers and migrates persisted viewing progress between
//! representations.
//!
//! Overview
//! - The [`Lcars`] orchestrator fans an episode lookup out to every enabled
//!   provider concurrently, scores and merges the partial records, and
//!   returns a unified record with provenance.
//! - The [`JobQueue`] runs enrichment in the background: priority dispatch,
//!   cooperative cancellation, pause/resume, retry with backoff, and typed
//!   lifecycle events.
//! - The [`Scheduler`] gates dispatch on device/network conditions (peak
//!   hours, battery, metered links) without touching the queue directly.
//! - The [`CacheWarmer`] enqueues speculative lookups (premieres, next in
//!   sequence, era leads, new content).
//! - The [`MigrationEngine`] rewrites the persisted progress list between
//!   season-level and episode-level ids under persisted transactions with
//!   rollback.
//!
//! Key behaviors and trade-offs
//! - Provider fan-out is bounded by the number of enabled providers; each
//!   call gets an independent timeout, and the merge result is a pure
//!   function of the record set, not of arrival order.
//! - The queue never refuses additions; backpressure is expressed through
//!   `queue-paused` and `sync-capability-change` events.
//! - Forward migration is lossless for cataloged seasons; rolling back a
//!   partial season is documented as lossy and drops the partial set.
#![warn(missing_docs)]

pub(crate) mod core;
mod migrate;
mod queue;
mod resolver;
mod scheduler;
mod warmer;

#[cfg(feature = "http")]
mod http;

pub use crate::core::{Lcars, LcarsBuilder};
pub use migrate::MigrationEngine;
pub use queue::{JobQueue, JobRunner};
pub use resolver::{EnrichCategory, EnrichOutcome};
pub use scheduler::{ConditionSource, Scheduler, SharedCondition};
pub use warmer::{CacheWarmer, WarmRequest};

#[cfg(feature = "http")]
pub use http::ReqwestFetcher;

// Re-export the vocabulary types for convenience.
pub use lcars_core::{
    CancelToken, Catalog, Clock, EpisodeEntry, Era, FetchResponse, Fetcher, KvStore,
    MetadataProvider, ProviderProfile, QualityScorer, SeriesEntry, SystemClock,
};
pub use lcars_middleware::{CacheStats, RequestCache, RetryPolicy, TokenBucket, TransportBuilder};
pub use lcars_types::{
    CacheConfig, ConflictDecision, DeviceCondition, EnrichmentStatus, EpisodeField, EpisodeId,
    EpisodeRecord, Event, EventSink, Job, JobId, JobKind, JobSpec, JobStatus, LcarsError,
    MergeStrategy, MetadataSource, MigrationReport, MigrationState, NullSink, ProgressVersion,
    ProviderRecord, QueueConfig, QueueProgress, ResolverConfig, SchedulerConfig, SeasonId,
    UnifiedMetadata, WarmerConfig, WarmingStats, WarmingStrategy,
};
