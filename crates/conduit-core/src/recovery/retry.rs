//! Retry policy: whether and when to re-attempt a failed call
//!
//! Backoff is exponential: `min(max_delay, base_delay * multiplier^(attempt-1))`, optionally
//! scaled by a uniform factor in `[0.5, 1.0]` so concurrent callers do not retry in lockstep.

use crate::error::{ApiClientError, ConduitError, ConduitResult};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff curve. Only exponential backoff is supported today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    #[default]
    Exponential,
}

/// Configuration for retry behavior
///
/// # Example
/// ```
/// use conduit_core::recovery::RetryConfig;
/// use std::time::Duration;
///
/// let config = RetryConfig::default()
///     .with_max_attempts(5)
///     .with_base_delay(Duration::from_millis(200))
///     .with_max_delay(Duration::from_secs(10));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,
    /// Upper bound for any single delay
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
    /// Growth factor between consecutive delays
    pub backoff_multiplier: f64,
    /// Randomize delays to avoid synchronized retry storms
    #[serde(default = "default_jitter")]
    pub jitter: bool,
    #[serde(default)]
    pub strategy: BackoffStrategy,
}

fn default_jitter() -> bool {
    true
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
            strategy: BackoffStrategy::Exponential,
        }
    }
}

impl RetryConfig {
    /// Create a config that makes a single attempt
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Create a config optimized for rate-limited APIs
    pub fn for_rate_limited() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
            strategy: BackoffStrategy::Exponential,
        }
    }

    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn validate(&self) -> ConduitResult<()> {
        if self.max_attempts == 0 {
            return Err(ConduitError::config("retry.max_attempts must be at least 1"));
        }
        if self.base_delay > self.max_delay {
            return Err(ConduitError::config(format!(
                "retry.base_delay ({:?}) must not exceed retry.max_delay ({:?})",
                self.base_delay, self.max_delay
            )));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier <= 1.0 {
            return Err(ConduitError::config(format!(
                "retry.backoff_multiplier must be greater than 1, got {}",
                self.backoff_multiplier
            )));
        }
        Ok(())
    }
}

/// Retry decisions for one client
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// `attempt` is the number of attempts already made (1 after the first failure)
    pub fn should_retry(&self, error: &ApiClientError, attempt: u32) -> bool {
        attempt < self.config.max_attempts && error.is_retryable()
    }

    /// Delay ceiling before retrying after `attempt`, without jitter
    pub fn base_delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let raw = self.config.base_delay.as_secs_f64() * self.config.backoff_multiplier.powi(exponent);
        let capped = raw.min(self.config.max_delay.as_secs_f64());
        Duration::try_from_secs_f64(capped)
            .map(|delay| delay.min(self.config.max_delay))
            .unwrap_or(self.config.max_delay)
    }

    /// Delay before retrying after `attempt`, jitter applied when configured
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let ceiling = self.base_delay_for_attempt(attempt);
        if !self.config.jitter {
            return ceiling;
        }
        let factor = rand::thread_rng().gen_range(0.5..=1.0);
        Duration::try_from_secs_f64(ceiling.as_secs_f64() * factor)
            .map(|delay| delay.min(ceiling))
            .unwrap_or(ceiling)
    }

    /// Delay for a concrete failure; an upstream `retry_after` hint wins, capped at `max_delay`
    pub fn backoff_for(&self, error: &ApiClientError, attempt: u32) -> Duration {
        match error.retry_after {
            Some(hint) => hint.min(self.config.max_delay),
            None => self.delay_for_attempt(attempt),
        }
    }
}
