//! Resilience primitives shared by every client
//!
//! This module provides:
//! - Retry policy with exponential backoff and jitter
//! - Circuit breaker for failing upstreams
//! - Fixed-window rate limiting with optional queueing

pub mod circuit_breaker;
pub mod rate_limiter;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use retry::{BackoffStrategy, RetryConfig, RetryPolicy};

use std::time::Duration;
use tokio::time::Instant;

/// Roughly thirty years, used as "never" when a configured duration does not fit an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `start + duration`, clamped to a far-future instant instead of overflowing
pub(crate) fn instant_after(start: Instant, duration: Duration) -> Instant {
    start
        .checked_add(duration)
        .or_else(|| start.checked_add(FAR_FUTURE))
        .unwrap_or(start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instant_after_clamps_overflow() {
        let now = Instant::now();
        assert_eq!(instant_after(now, Duration::from_secs(1)), now + Duration::from_secs(1));
        assert!(instant_after(now, Duration::MAX) > now + Duration::from_secs(86_400 * 365));
    }
}
