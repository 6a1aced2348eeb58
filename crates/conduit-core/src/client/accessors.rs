//! API client accessors

use super::types::ApiClient;
use crate::config::ClientConfig;
use crate::recovery::circuit_breaker::CircuitBreakerStats;
use crate::recovery::rate_limiter::RateLimiterStats;
use std::sync::atomic::Ordering;

impl ApiClient {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Provider identifier of the backend
    pub fn provider(&self) -> &'static str {
        self.backend.provider()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Whether credentials were stored via `authenticate`
    pub fn is_authenticated(&self) -> bool {
        self.credentials.read().is_some()
    }

    pub fn breaker_stats(&self) -> CircuitBreakerStats {
        self.breaker.stats()
    }

    /// `None` when the client has no rate limit
    pub fn limiter_stats(&self) -> Option<RateLimiterStats> {
        self.limiter.as_ref().map(|limiter| limiter.stats())
    }

    /// Force the circuit breaker closed
    pub fn reset_circuit_breaker(&self) {
        self.breaker.reset();
    }
}
