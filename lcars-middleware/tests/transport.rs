use std::sync::Arc;
use std::time::Duration;

use lcars_core::CancelToken;
use lcars_middleware::{RequestCache, Transport};
use lcars_mock::MockFetcher;
use lcars_types::{LcarsError, QuotaConfig, RateLimitConfig, RetryConfig};

const URL: &str = "https://api.example.test/episode/1";
const TTL: Duration = Duration::from_secs(60);

fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(100),
        backoff_multiplier: 2.0,
        jitter: Duration::ZERO,
    }
}

#[tokio::test]
async fn a_cache_hit_skips_the_fetcher_entirely() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(RequestCache::new(dir.path(), true));
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.push_ok(URL, b"fresh");

    let transport = Transport::builder("test", Arc::clone(&fetcher) as _)
        .with_cache(Arc::clone(&cache))
        .with_retry(fast_retry(0))
        .build();

    let cancel = CancelToken::new();
    assert_eq!(transport.get(URL, TTL, &cancel).await.unwrap(), b"fresh");
    assert_eq!(transport.get(URL, TTL, &cancel).await.unwrap(), b"fresh");
    assert_eq!(fetcher.request_count(), 1, "second read must come from cache");
}

#[tokio::test(start_paused = true)]
async fn transient_statuses_retry_until_success() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.push_status(URL, 503, b"");
    fetcher.push_status(URL, 503, b"");
    fetcher.push_ok(URL, b"done");

    let transport = Transport::builder("test", Arc::clone(&fetcher) as _)
        .with_retry(fast_retry(3))
        .build();

    let body = transport.get(URL, TTL, &CancelToken::new()).await.unwrap();
    assert_eq!(body, b"done");
    assert_eq!(fetcher.request_count(), 3);
}

#[tokio::test]
async fn permanent_statuses_surface_without_retry() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.push_status(URL, 404, b"");

    let transport = Transport::builder("test", Arc::clone(&fetcher) as _)
        .with_retry(fast_retry(3))
        .build();

    let err = transport
        .get(URL, TTL, &CancelToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, LcarsError::Http { status: 404, .. }));
    assert_eq!(fetcher.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn exhausting_retries_reports_the_last_error() {
    let fetcher = Arc::new(MockFetcher::new());
    for _ in 0..3 {
        fetcher.push_status(URL, 503, b"");
    }

    let transport = Transport::builder("test", Arc::clone(&fetcher) as _)
        .with_retry(fast_retry(2))
        .build();

    let err = transport
        .get(URL, TTL, &CancelToken::new())
        .await
        .unwrap_err();
    match err {
        LcarsError::Exhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, LcarsError::Http { status: 503, .. }));
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
}

#[tokio::test]
async fn quota_exhaustion_blocks_before_the_fetch() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.push_ok(URL, b"one");

    let transport = Transport::builder("test", Arc::clone(&fetcher) as _)
        .with_retry(fast_retry(0))
        .with_quota(QuotaConfig {
            limit: 1,
            window: Duration::from_secs(3_600),
        })
        .build();

    let cancel = CancelToken::new();
    transport.get(URL, TTL, &cancel).await.unwrap();
    let err = transport.get(URL, TTL, &cancel).await.unwrap_err();
    assert!(matches!(err, LcarsError::QuotaExceeded { .. }));
    assert_eq!(fetcher.request_count(), 1);
}

#[tokio::test]
async fn a_failed_cache_write_does_not_fail_the_request() {
    // Point the cache at a path that cannot be a directory.
    let file = tempfile::NamedTempFile::new().unwrap();
    let cache = Arc::new(RequestCache::new(file.path(), true));
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.push_ok(URL, b"payload");

    let transport = Transport::builder("test", Arc::clone(&fetcher) as _)
        .with_cache(cache)
        .with_retry(fast_retry(0))
        .build();

    let body = transport.get(URL, TTL, &CancelToken::new()).await.unwrap();
    assert_eq!(body, b"payload");
}

#[tokio::test]
async fn pre_fetch_cancellation_short_circuits() {
    let fetcher = Arc::new(MockFetcher::new());
    let transport = Transport::builder("test", Arc::clone(&fetcher) as _)
        .with_rate_limit(RateLimitConfig {
            requests_per_second: 1.0,
            burst_size: 1,
        })
        .with_retry(fast_retry(0))
        .build();

    let cancel = CancelToken::new();
    cancel.cancel();
    let err = transport
        .get(URL, TTL, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, LcarsError::Cancelled));
    assert_eq!(fetcher.request_count(), 0);
}
