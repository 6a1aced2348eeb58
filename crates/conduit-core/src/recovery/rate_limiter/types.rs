//! Type definitions for rate limiting

use crate::error::{ConduitError, ConduitResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Per-client request budget
///
/// # Examples
///
/// ```
/// use conduit_core::recovery::rate_limiter::RateLimitConfig;
/// use std::time::Duration;
///
/// // Slack tier 3: ~50 requests per minute, queue the overflow
/// let config = RateLimitConfig::new(50, Duration::from_secs(60)).with_queue(true);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Admissions allowed per window
    pub max_requests: u32,
    /// Window length
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    /// Queue callers over budget instead of rejecting them
    #[serde(default)]
    pub queue_requests: bool,
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            queue_requests: false,
        }
    }

    /// Requests per minute shorthand
    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    pub fn with_queue(mut self, queue_requests: bool) -> Self {
        self.queue_requests = queue_requests;
        self
    }

    pub fn validate(&self) -> ConduitResult<()> {
        if self.max_requests == 0 {
            return Err(ConduitError::config("rate_limit.max_requests must be at least 1"));
        }
        if self.window.is_zero() {
            return Err(ConduitError::config("rate_limit.window must be non-zero"));
        }
        Ok(())
    }
}

/// Snapshot of limiter usage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RateLimiterStats {
    pub admitted_in_window: u32,
    pub max_requests: u32,
    pub queued: usize,
    pub total_admitted: u64,
    pub total_rejected: u64,
}

/// Rate limit errors
#[derive(Debug, Clone, PartialEq)]
pub enum RateLimitError {
    /// Over budget and queueing is disabled
    Rejected { retry_in: Duration },
    /// Deadline would pass before the caller reaches the front of the queue
    QueueTimeout { waited: Duration },
}

impl fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected { retry_in } => {
                write!(f, "Rate limit exceeded, window resets in {:?}", retry_in)
            }
            Self::QueueTimeout { waited } => {
                write!(f, "Gave up waiting in rate limit queue after {:?}", waited)
            }
        }
    }
}

impl std::error::Error for RateLimitError {}
