use std::sync::Arc;
use std::time::Duration;

use lcars_middleware::TokenBucket;
use lcars_types::RateLimitConfig;

fn bucket(rps: f64, burst: u32) -> TokenBucket {
    TokenBucket::new(&RateLimitConfig {
        requests_per_second: rps,
        burst_size: burst,
    })
}

#[tokio::test(start_paused = true)]
async fn burst_drains_immediately_then_blocks() {
    let bucket = bucket(1.0, 3);
    assert!(bucket.try_acquire());
    assert!(bucket.try_acquire());
    assert!(bucket.try_acquire());
    assert!(!bucket.try_acquire());

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(bucket.try_acquire());
    assert!(!bucket.try_acquire());
}

#[tokio::test(start_paused = true)]
async fn refill_is_fractional() {
    let bucket = bucket(2.0, 2);
    assert!(bucket.try_acquire());
    assert!(bucket.try_acquire());
    // Half a second at 2 req/s refills exactly one token.
    tokio::time::advance(Duration::from_millis(500)).await;
    assert!(bucket.try_acquire());
    assert!(!bucket.try_acquire());
}

#[tokio::test(start_paused = true)]
async fn acquire_spaces_requests_at_the_configured_rate() {
    let bucket = bucket(4.0, 2);
    let start = tokio::time::Instant::now();
    for _ in 0..6 {
        bucket.acquire().await;
    }
    // Two from the burst, four refilled at 250 ms apiece.
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(1_000), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1_200), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn waiters_are_served_fifo() {
    let bucket = Arc::new(bucket(1.0, 1));
    bucket.acquire().await; // drain the burst

    let order = Arc::new(std::sync::Mutex::new(Vec::new()));
    let mut handles = Vec::new();
    for label in 0..3u32 {
        let bucket = Arc::clone(&bucket);
        let order = Arc::clone(&order);
        handles.push(tokio::spawn(async move {
            bucket.acquire().await;
            order.lock().unwrap().push(label);
        }));
        // Let the waiter enqueue before spawning the next one.
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
}

#[tokio::test(start_paused = true)]
async fn dropping_a_waiter_consumes_nothing() {
    let bucket = bucket(1.0, 1);
    bucket.acquire().await;

    // A waiter that gets dropped while suspended must not take the token.
    let pending = tokio::time::timeout(Duration::from_millis(100), bucket.acquire()).await;
    assert!(pending.is_err());

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(bucket.try_acquire());
}
