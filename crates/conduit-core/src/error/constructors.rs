//! Constructor methods for ApiClientError and ConduitError

use super::types::{ApiClientError, ConduitError, ErrorCategory};
use std::collections::BTreeMap;
use std::time::Duration;

impl ApiClientError {
    /// Create an error with the default retryability of its category
    pub fn new(category: ErrorCategory, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            category,
            status_code: None,
            retryable: category.is_retryable(),
            retry_after: None,
            attempts: None,
            context: BTreeMap::new(),
        }
    }

    /// Classify an upstream HTTP status
    pub fn from_status(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::from_status(status), code, message).with_status(status)
    }

    /// Bad, expired or incompatible credentials
    pub fn authentication(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Authentication, code, message)
    }

    /// Non-retryable caller error
    pub fn client_error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::ClientError, code, message)
    }

    /// Upstream 5xx
    pub fn server_error(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::ServerError, "SERVER_ERROR", message).with_status(status)
    }

    /// Rate limited, locally or by the upstream
    pub fn rate_limited(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::RateLimit, code, message)
    }

    /// Connection-level failure
    pub fn network(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Network, code, message)
    }

    /// Timer expiry anywhere in the call chain
    pub fn timeout(code: impl Into<String>, elapsed: Duration) -> Self {
        Self::new(
            ErrorCategory::Network,
            code,
            format!("Request timed out after {}ms", elapsed.as_millis()),
        )
    }

    /// Breaker rejection, synthesized without network I/O
    pub fn circuit_open(client: &str) -> Self {
        Self::new(
            ErrorCategory::CircuitOpen,
            "CIRCUIT_OPEN",
            format!("Circuit breaker open for client '{}'", client),
        )
        .with_context("client", client)
    }

    /// Unclassified failure, treated as non-retryable
    pub fn unknown(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Unknown, code, message)
    }

    /// Attach an HTTP status code
    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    /// Override retryability
    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Attach an upstream retry hint
    pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }

    /// Record how many attempts were made
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    /// Add a context entry
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Whether this outcome should count against the circuit breaker
    pub fn counts_as_upstream_failure(&self) -> bool {
        self.category.counts_as_upstream_failure()
    }
}

impl ConduitError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a not-registered error
    pub fn not_registered(name: impl Into<String>) -> Self {
        Self::NotRegistered { name: name.into() }
    }
}
