//! Configuration types shared across the orchestrator, middleware, and
//! provider clients.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::provider::MetadataSource;
use crate::unified::MergeStrategy;

/// Token-bucket rate limit for a single provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Continuous refill rate.
    pub requests_per_second: f64,
    /// Bucket capacity; bounds any burst.
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 1.0,
            burst_size: 3,
        }
    }
}

/// Exponential backoff configuration for retried provider calls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Multiplier applied per attempt (>= 1).
    pub backoff_multiplier: f64,
    /// Uniform jitter added in [-jitter, +jitter]; the result clamps at zero.
    pub jitter: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: Duration::from_millis(250),
        }
    }
}

/// Resource classes with distinct cache lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheResource {
    /// Episode payloads.
    Episode,
    /// Series-level payloads.
    Series,
    /// Person/staff payloads.
    Person,
    /// Provider health probes.
    Health,
    /// Analytics payloads.
    Analytics,
}

/// Durable request cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding `<sha256>.json` entries.
    pub dir: PathBuf,
    /// Disable to turn every cache operation into a no-op miss.
    pub enabled: bool,
    /// TTL for episode payloads.
    pub episode_ttl: Duration,
    /// TTL for series payloads.
    pub series_ttl: Duration,
    /// TTL for person payloads.
    pub person_ttl: Duration,
    /// TTL for health probes.
    pub health_ttl: Duration,
    /// TTL for analytics payloads.
    pub analytics_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".lcars-cache"),
            enabled: true,
            episode_ttl: Duration::from_secs(24 * 60 * 60),
            series_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            person_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            health_ttl: Duration::from_secs(5 * 60),
            analytics_ttl: Duration::from_secs(60 * 60),
        }
    }
}

impl CacheConfig {
    /// TTL for a resource class.
    #[must_use]
    pub const fn ttl_for(&self, resource: CacheResource) -> Duration {
        match resource {
            CacheResource::Episode => self.episode_ttl,
            CacheResource::Series => self.series_ttl,
            CacheResource::Person => self.person_ttl,
            CacheResource::Health => self.health_ttl,
            CacheResource::Analytics => self.analytics_ttl,
        }
    }
}

/// Soft daily call budget for a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Maximum calls within a single window.
    pub limit: u64,
    /// Accounting window length.
    pub window: Duration,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            limit: 1000,
            window: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Job queue configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum concurrently running jobs.
    pub max_concurrent: usize,
    /// Floor on the dispatch loop interval.
    pub processing_interval: Duration,
    /// Per-job execution timeout; a timeout retries like a transient failure.
    pub job_timeout: Duration,
    /// Base for the retry requeue delay (`base * 2^retry_count`).
    pub retry_base_delay: Duration,
    /// Default retry budget for jobs that do not override it.
    pub default_max_retries: u32,
    /// Terminal jobs retained for progress reporting.
    pub history_limit: usize,
    /// Samples in the rolling duration window used for the ETA.
    pub duration_window: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 3,
            processing_interval: Duration::from_secs(1),
            job_timeout: Duration::from_secs(30),
            retry_base_delay: Duration::from_secs(1),
            default_max_retries: 3,
            history_limit: 100,
            duration_window: 100,
        }
    }
}

/// Cache-warming configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmerConfig {
    /// Minimum interval between warming waves.
    pub min_interval: Duration,
    /// Base priority for warm jobs; strategies adjust around it. Kept below
    /// user-initiated refresh priorities.
    pub default_priority: i32,
    /// Episodes to look ahead for sequence-based strategies.
    pub lookahead: usize,
    /// Leading episodes enqueued for era-based warming.
    pub era_lead: usize,
}

impl Default for WarmerConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(60),
            default_priority: 10,
            lookahead: 3,
            era_lead: 5,
        }
    }
}

/// Metadata resolver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Conflict resolution strategy.
    pub strategy: MergeStrategy,
    /// Per-provider time budget inside a fan-out.
    pub provider_timeout: Duration,
    /// Version string stamped onto unified records.
    pub version: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            strategy: MergeStrategy::default(),
            provider_timeout: Duration::from_secs(10),
            version: "2".to_string(),
        }
    }
}

/// Production transport defaults for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProviderDefaults {
    /// Token-bucket configuration.
    pub rate_limit: RateLimitConfig,
    /// Retry policy.
    pub retry: RetryConfig,
    /// Soft daily quota.
    pub quota: QuotaConfig,
}

impl ProviderDefaults {
    /// The production defaults for sources that have a network client.
    /// Returns `None` for tag-only sources.
    #[must_use]
    pub fn production(source: MetadataSource) -> Option<Self> {
        let day = Duration::from_secs(24 * 60 * 60);
        let (rps, burst, retries, quota) = match source {
            MetadataSource::MemoryAlpha => (1.0, 3, 2, 86_400),
            MetadataSource::Tmdb => (4.0, 40, 3, 1_000),
            MetadataSource::TrekCore => (0.5, 2, 1, 100),
            MetadataSource::Stapi => (2.0, 10, 3, 10_000),
            _ => return None,
        };
        Some(Self {
            rate_limit: RateLimitConfig {
                requests_per_second: rps,
                burst_size: burst,
            },
            retry: RetryConfig {
                max_retries: retries,
                ..RetryConfig::default()
            },
            quota: QuotaConfig {
                limit: quota,
                window: day,
            },
        })
    }
}
