//! Core error types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type for request-path operations
pub type ApiResult<T> = Result<T, ApiClientError>;

/// Result type for configuration and registry operations
pub type ConduitResult<T> = Result<T, ConduitError>;

/// Error category used for retry decisions and user-facing messaging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Bad, expired or incompatible credentials
    Authentication,
    /// 4xx other than 429
    ClientError,
    /// 5xx
    ServerError,
    /// Upstream 429 or local limiter rejection
    RateLimit,
    /// Timeouts and connection failures
    Network,
    /// Rejected by the circuit breaker without network I/O
    CircuitOpen,
    /// Unclassified provider error
    Unknown,
}

impl ErrorCategory {
    /// Classify an HTTP status code
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Authentication,
            429 => Self::RateLimit,
            400..=499 => Self::ClientError,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Whether errors of this category are retried by default
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimit | Self::ServerError | Self::Network)
    }

    /// Whether an outcome of this category counts as an upstream failure for the breaker.
    ///
    /// Client and authentication errors are answers from a reachable upstream.
    pub fn counts_as_upstream_failure(&self) -> bool {
        matches!(
            self,
            Self::ServerError | Self::Network | Self::RateLimit | Self::Unknown
        )
    }

    /// Stable snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::ClientError => "client_error",
            Self::ServerError => "server_error",
            Self::RateLimit => "rate_limit",
            Self::Network => "network",
            Self::CircuitOpen => "circuit_open",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized error produced by every exit path of `ApiClient::make_request`
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("[{category}] {code}: {message}")]
pub struct ApiClientError {
    /// Provider-specific or framework error code (e.g. `PERMISSION_DENIED`, `missing_scope`)
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Error category
    pub category: ErrorCategory,
    /// HTTP status code, when the upstream answered
    pub status_code: Option<u16>,
    /// Whether the retry loop may re-attempt the call
    pub retryable: bool,
    /// Upstream hint for how long to wait before retrying
    #[serde(with = "humantime_serde")]
    pub retry_after: Option<Duration>,
    /// Number of attempts made before this error was surfaced
    pub attempts: Option<u32>,
    /// Provider, client, request and diagnostic details
    pub context: BTreeMap<String, String>,
}

/// Errors outside the request path
#[derive(Error, Debug)]
pub enum ConduitError {
    /// Invalid or unloadable configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// No recipe registered under this name
    #[error("Client not registered: {name}")]
    NotRegistered { name: String },

    /// Failure raised by a client while constructing or initializing it
    #[error(transparent)]
    Client(#[from] ApiClientError),
}

impl From<::config::ConfigError> for ConduitError {
    fn from(err: ::config::ConfigError) -> Self {
        Self::Config {
            message: err.to_string(),
            context: Some("Loading settings".to_string()),
        }
    }
}
