//! Circuit breaker types and configuration

use crate::error::{ConduitError, ConduitResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Circuit is closed, operations proceed normally
    Closed,
    /// Circuit is open, operations are rejected
    Open,
    /// Circuit is half-open, limited operations allowed to test recovery
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit
    pub failure_threshold: u32,
    /// Time to wait in open state before admitting probes
    #[serde(with = "humantime_serde")]
    pub recovery_timeout: Duration,
    /// Consecutive probe successes needed in half-open state to close
    pub success_threshold: u32,
    /// Per-attempt timeout; expiry counts as a failure
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Maximum concurrent probes in half-open state
    #[serde(default = "default_half_open_max_requests")]
    pub half_open_max_requests: u32,
}

fn default_half_open_max_requests() -> u32 {
    1
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
            timeout: Duration::from_secs(10),
            half_open_max_requests: 1,
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a config for aggressive circuit breaking
    pub fn aggressive() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(15),
            success_threshold: 1,
            timeout: Duration::from_secs(5),
            half_open_max_requests: 1,
        }
    }

    /// Create a config for lenient circuit breaking
    pub fn lenient() -> Self {
        Self {
            failure_threshold: 10,
            recovery_timeout: Duration::from_secs(60),
            success_threshold: 3,
            timeout: Duration::from_secs(60),
            half_open_max_requests: 3,
        }
    }

    pub fn validate(&self) -> ConduitResult<()> {
        if self.failure_threshold == 0 {
            return Err(ConduitError::config(
                "circuit_breaker.failure_threshold must be at least 1",
            ));
        }
        if self.success_threshold == 0 {
            return Err(ConduitError::config(
                "circuit_breaker.success_threshold must be at least 1",
            ));
        }
        if self.half_open_max_requests == 0 {
            return Err(ConduitError::config(
                "circuit_breaker.half_open_max_requests must be at least 1",
            ));
        }
        if self.timeout.is_zero() {
            return Err(ConduitError::config("circuit_breaker.timeout must be non-zero"));
        }
        Ok(())
    }
}

/// Returned by `CircuitBreaker::try_acquire` when a call is not admitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakerRejection {
    pub state: CircuitState,
    /// Time left until probes are admitted, when open
    pub retry_in: Option<Duration>,
}

/// Statistics for a circuit breaker
#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    pub half_open_in_flight: u32,
    pub total_calls: u64,
    pub total_failures: u64,
    pub total_rejections: u64,
    #[serde(skip)]
    pub opened_at: Option<Instant>,
}

impl CircuitBreakerStats {
    /// Calculate failure rate as a percentage
    pub fn failure_rate(&self) -> f64 {
        if self.total_calls == 0 {
            0.0
        } else {
            (self.total_failures as f64 / self.total_calls as f64) * 100.0
        }
    }
}
