//! Per-provider token-bucket rate limiting.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use lcars_types::RateLimitConfig;

/// Token bucket with continuous fractional refill.
///
/// `acquire` suspends the caller until a token is available; waiters are
/// served FIFO by arrival. Dropping a waiting `acquire` future releases the
/// wait slot without consuming a token.
pub struct TokenBucket {
    rate: f64,
    burst: f64,
    state: Mutex<BucketState>,
    // Tokio's mutex queues waiters fairly; holding it across the refill wait
    // gives FIFO admission.
    turnstile: tokio::sync::Mutex<()>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// A full bucket with the configured rate and burst capacity.
    #[must_use]
    pub fn new(cfg: &RateLimitConfig) -> Self {
        let burst = f64::from(cfg.burst_size.max(1));
        Self {
            rate: cfg.requests_per_second.max(f64::MIN_POSITIVE),
            burst,
            state: Mutex::new(BucketState {
                tokens: burst,
                last_refill: Instant::now(),
            }),
            turnstile: tokio::sync::Mutex::new(()),
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rate).min(self.burst);
        state.last_refill = now;
    }

    /// Take a token without waiting. Returns `false` when none is available.
    #[must_use]
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().expect("mutex poisoned");
        self.refill(&mut state);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Take a token, suspending until one refills. Never fails; only delays.
    pub async fn acquire(&self) {
        let _slot = self.turnstile.lock().await;
        loop {
            let wait = {
                let mut state = self.state.lock().expect("mutex poisoned");
                self.refill(&mut state);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                Duration::from_secs_f64((1.0 - state.tokens) / self.rate)
            };
            tokio::time::sleep(wait).await;
        }
    }
}
