//! Per-client configuration

use crate::error::{ConduitError, ConduitResult};
use crate::recovery::{CircuitBreakerConfig, RateLimitConfig, RetryConfig};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Configuration for one named client. Immutable once the client is built.
///
/// # Examples
///
/// ```
/// use conduit_core::config::ClientConfig;
/// use conduit_core::recovery::RateLimitConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new("https://api.example.com")
///     .with_timeout(Duration::from_secs(20))
///     .with_rate_limit(RateLimitConfig::per_minute(60))
///     .with_default_header("User-Agent", "conduit");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL every endpoint is joined onto
    pub base_url: String,
    /// Overall deadline for one `make_request` call, retries included
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
    /// Headers sent with every request
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            rate_limit: None,
            default_headers: BTreeMap::new(),
        }
    }

    /// Google REST APIs (Gmail, Calendar, People)
    pub fn for_google() -> Self {
        Self::new("https://www.googleapis.com")
            .with_timeout(Duration::from_secs(30))
            .with_rate_limit(RateLimitConfig::new(100, Duration::from_secs(1)).with_queue(true))
    }

    pub fn for_openai() -> Self {
        Self::new("https://api.openai.com/v1")
            .with_timeout(Duration::from_secs(60))
            .with_retry(RetryConfig::for_rate_limited())
            .with_circuit_breaker(CircuitBreakerConfig {
                timeout: Duration::from_secs(45),
                ..CircuitBreakerConfig::default()
            })
    }

    pub fn for_slack() -> Self {
        Self::new("https://slack.com/api")
            .with_timeout(Duration::from_secs(30))
            .with_rate_limit(RateLimitConfig::per_minute(50).with_queue(true))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    pub fn without_rate_limit(mut self) -> Self {
        self.rate_limit = None;
        self
    }

    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Parsed base URL
    pub fn url(&self) -> ConduitResult<Url> {
        Url::parse(&self.base_url).map_err(|e| {
            ConduitError::config_with_context(
                format!("Invalid base_url '{}': {}", self.base_url, e),
                "client.base_url",
            )
        })
    }

    pub fn validate(&self) -> ConduitResult<()> {
        let url = self.url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConduitError::config(format!(
                "base_url must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.timeout.is_zero() {
            return Err(ConduitError::config("timeout must be non-zero"));
        }
        self.retry.validate()?;
        self.circuit_breaker.validate()?;
        if let Some(rate_limit) = &self.rate_limit {
            rate_limit.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_presets_are_valid() {
        for config in [
            ClientConfig::for_google(),
            ClientConfig::for_openai(),
            ClientConfig::for_slack(),
        ] {
            assert!(config.validate().is_ok(), "{:?}", config);
        }
        assert!(ClientConfig::for_openai().rate_limit.is_none());
        assert!(ClientConfig::for_slack().rate_limit.unwrap().queue_requests);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(ClientConfig::new("not a url").validate().is_err());
        assert!(ClientConfig::new("ftp://example.com").validate().is_err());
        assert!(
            ClientConfig::new("https://example.com")
                .with_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
        assert!(
            ClientConfig::new("https://example.com")
                .with_retry(RetryConfig::default().with_max_attempts(0))
                .validate()
                .is_err()
        );
        assert!(
            ClientConfig::new("https://example.com")
                .with_rate_limit(RateLimitConfig::new(0, Duration::from_secs(1)))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_deserialize_with_humantime_durations() {
        let config: ClientConfig = toml::from_str(
            r#"
            base_url = "https://slack.com/api"
            timeout = "15s"

            [retry]
            max_attempts = 4
            base_delay = "250ms"
            max_delay = "5s"
            backoff_multiplier = 2.0

            [rate_limit]
            max_requests = 50
            window = "1m"
            queue_requests = true
            "#,
        )
        .unwrap();

        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.retry.base_delay, Duration::from_millis(250));
        assert!(config.retry.jitter);
        assert_eq!(config.circuit_breaker, CircuitBreakerConfig::default());
        let rate_limit = config.rate_limit.unwrap();
        assert_eq!(rate_limit.window, Duration::from_secs(60));
        assert!(rate_limit.queue_requests);
    }
}
