// Minimum-interval rate limiter for LLM calls.
//
// Local endpoints fall over when hammered and hosted ones throttle, so
// successive requests are spaced at least `1 / requests_per_second` apart.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct RateLimiter {
    inner: Arc<Mutex<Option<Instant>>>,
    interval: Duration,
}

impl RateLimiter {
    /// Allow at most `requests_per_second` requests per second.
    /// Non-positive or non-finite rates disable limiting; a rate so small
    /// its interval can't be represented is an error.
    pub fn new(requests_per_second: f64) -> Result<Self> {
        let interval = if requests_per_second.is_finite() && requests_per_second > 0.0 {
            Duration::try_from_secs_f64(1.0 / requests_per_second).map_err(|_| {
                anyhow::anyhow!("Request rate {requests_per_second}/s is too small to schedule")
            })?
        } else {
            Duration::ZERO
        };
        Ok(Self {
            inner: Arc::new(Mutex::new(None)),
            interval,
        })
    }

    /// Wait until the next request is allowed.
    pub async fn acquire(&self) {
        let mut last = self.inner.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.interval {
                // Sleep while holding the lock so waiters queue in order.
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_request_is_immediate() {
        let limiter = RateLimiter::new(1.0).unwrap();
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_second_request_waits() {
        let limiter = RateLimiter::new(5.0).unwrap(); // 200ms spacing
        limiter.acquire().await;
        let start = Instant::now();
        limiter.acquire().await;
        let elapsed = start.elapsed();
        assert!(
            elapsed >= Duration::from_millis(150),
            "Expected ~200ms delay, got {:?}",
            elapsed
        );
    }

    #[tokio::test]
    async fn test_zero_rate_disables_limiting() {
        let limiter = RateLimiter::new(0.0).unwrap();
        limiter.acquire().await;
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_tiny_rate_is_an_error() {
        let err = RateLimiter::new(1e-30).unwrap_err();
        assert!(err.to_string().contains("too small"));
        assert!(RateLimiter::new(0.001).is_ok());
    }
}
