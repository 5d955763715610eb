//! Builder for composing a provider transport with middleware layers.
//!
//! The layering is fixed by policy: the cache sits outermost (a hit skips
//! every other layer), then the rate limiter, then the quota guard, then the
//! retried fetch innermost. The builder only selects which layers exist.

use std::sync::Arc;

use lcars_core::Fetcher;
use lcars_types::{ProviderDefaults, QuotaConfig, RateLimitConfig, RetryConfig};

use crate::cache::RequestCache;
use crate::quota::DailyQuota;
use crate::ratelimit::TokenBucket;
use crate::retry::RetryPolicy;
use crate::transport::Transport;

/// Composes a [`Transport`] from optional middleware layers.
pub struct TransportBuilder {
    provider: &'static str,
    fetcher: Arc<dyn Fetcher>,
    rate_limit: Option<RateLimitConfig>,
    retry: RetryConfig,
    cache: Option<Arc<RequestCache>>,
    quota: Option<QuotaConfig>,
}

impl TransportBuilder {
    /// Start from a raw fetcher with no middleware and default retry.
    #[must_use]
    pub fn new(provider: &'static str, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            provider,
            fetcher,
            rate_limit: None,
            retry: RetryConfig::default(),
            cache: None,
            quota: None,
        }
    }

    /// Apply a provider's production defaults (rate limit, retry, quota) in
    /// one step.
    #[must_use]
    pub fn with_defaults(mut self, defaults: &ProviderDefaults) -> Self {
        self.rate_limit = Some(defaults.rate_limit);
        self.retry = defaults.retry;
        self.quota = Some(defaults.quota);
        self
    }

    /// Add or replace the token-bucket rate limit.
    #[must_use]
    pub fn with_rate_limit(mut self, cfg: RateLimitConfig) -> Self {
        self.rate_limit = Some(cfg);
        self
    }

    /// Remove the rate limit if present.
    #[must_use]
    pub fn without_rate_limit(mut self) -> Self {
        self.rate_limit = None;
        self
    }

    /// Replace the retry configuration.
    #[must_use]
    pub fn with_retry(mut self, cfg: RetryConfig) -> Self {
        self.retry = cfg;
        self
    }

    /// Attach a shared request cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<RequestCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Remove the cache if present.
    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    /// Add or replace the daily quota guard.
    #[must_use]
    pub fn with_quota(mut self, cfg: QuotaConfig) -> Self {
        self.quota = Some(cfg);
        self
    }

    /// Build the composed transport.
    #[must_use]
    pub fn build(self) -> Transport {
        Transport {
            provider: self.provider,
            fetcher: self.fetcher,
            limiter: self.rate_limit.as_ref().map(TokenBucket::new),
            retry: RetryPolicy::new(self.retry),
            cache: self.cache,
            quota: self.quota.map(DailyQuota::new),
        }
    }
}
