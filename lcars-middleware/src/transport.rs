//! The shared provider I/O path: cache, rate limit, quota, retried fetch.

use std::sync::Arc;
use std::time::Duration;

use lcars_core::{CancelToken, Fetcher};
use lcars_types::LcarsError;

use crate::cache::RequestCache;
use crate::quota::DailyQuota;
use crate::ratelimit::TokenBucket;
use crate::retry::RetryPolicy;

/// One provider's composed I/O stack.
///
/// Request path: cache lookup, then rate-limit acquisition, then the quota
/// check, then the fetch under the retry policy, then a cache fill. A cache
/// write failure is logged and does not fail the request.
pub struct Transport {
    pub(crate) provider: &'static str,
    pub(crate) fetcher: Arc<dyn Fetcher>,
    pub(crate) limiter: Option<TokenBucket>,
    pub(crate) retry: RetryPolicy,
    pub(crate) cache: Option<Arc<RequestCache>>,
    pub(crate) quota: Option<DailyQuota>,
}

impl Transport {
    /// Start composing a transport for `provider` over `fetcher`.
    #[must_use]
    pub fn builder(provider: &'static str, fetcher: Arc<dyn Fetcher>) -> crate::TransportBuilder {
        crate::TransportBuilder::new(provider, fetcher)
    }

    /// The provider label used in error tagging.
    #[must_use]
    pub const fn provider(&self) -> &'static str {
        self.provider
    }

    /// GET a URL, honoring the composed middleware.
    ///
    /// Status mapping: 2xx bodies return as bytes; 429 and 5xx surface as
    /// transient `Http` errors (retried); other non-success statuses are
    /// permanent `Http` errors the caller classifies (404 is typically
    /// "no data").
    ///
    /// # Errors
    /// `Cancelled` when the token fires at a suspension point, `Exhausted`
    /// when the retry budget runs out, `QuotaExceeded` when the daily budget
    /// is spent, or the terminal `Http`/`Network` failure.
    pub async fn get(
        &self,
        url: &str,
        ttl: Duration,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>, LcarsError> {
        if let Some(cache) = &self.cache
            && let Some(hit) = cache.get(url).await
        {
            return Ok(hit);
        }

        if cancel.is_cancelled() {
            return Err(LcarsError::Cancelled);
        }
        if let Some(limiter) = &self.limiter {
            tokio::select! {
                () = cancel.cancelled() => return Err(LcarsError::Cancelled),
                () = limiter.acquire() => {}
            }
        }
        if let Some(quota) = &self.quota {
            quota.should_allow_call()?;
        }

        let fetcher = Arc::clone(&self.fetcher);
        let request_url = url.to_string();
        let body = self
            .retry
            .run(cancel, move |_attempt| {
                let fetcher = Arc::clone(&fetcher);
                let url = request_url.clone();
                async move {
                    let resp = fetcher.fetch(&url, &[]).await?;
                    match resp.status {
                        200..=299 => Ok(resp.body),
                        status => Err(LcarsError::Http { status, url }),
                    }
                }
            })
            .await?;

        if let Some(cache) = &self.cache
            && let Err(err) = cache.set(url, &body, ttl).await
        {
            tracing::warn!(
                target: "lcars::middleware::transport",
                provider = self.provider,
                url,
                %err,
                "cache write failed; serving fetched payload uncached"
            );
        }
        Ok(body)
    }
}
