//! API client type definitions

use super::backend::ProviderBackend;
use crate::config::ClientConfig;
use crate::recovery::circuit_breaker::{CircuitBreaker, CircuitBreakerStats};
use crate::recovery::rate_limiter::{RateLimiter, RateLimiterStats};
use crate::recovery::RetryPolicy;
use crate::types::AuthCredentials;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Client for one named upstream service.
///
/// Every provider shares this request lifecycle: rate limiting, circuit breaking, retries
/// with backoff, timeouts and error normalization. Provider specifics come from the
/// `ProviderBackend` it is built with. Breaker and limiter state belong to this instance
/// alone.
///
/// # Examples
///
/// ```no_run
/// use conduit_core::client::ApiClient;
/// use conduit_core::config::ClientConfig;
/// use conduit_core::providers::SlackBackend;
/// use conduit_core::types::{ApiRequest, AuthCredentials};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::new("slack", ClientConfig::for_slack(), Arc::new(SlackBackend::new()))?;
/// client.initialize().await?;
/// client.authenticate(AuthCredentials::bearer("xoxb-..."))?;
///
/// let response = client
///     .make_request(ApiRequest::post("/chat.postMessage").with_json(serde_json::json!({
///         "channel": "C123",
///         "text": "hello",
///     })))
///     .await?;
/// println!("{}", response.data);
/// # Ok(())
/// # }
/// ```
pub struct ApiClient {
    pub(super) name: String,
    pub(super) config: ClientConfig,
    pub(super) backend: Arc<dyn ProviderBackend>,
    pub(super) retry: RetryPolicy,
    pub(super) breaker: CircuitBreaker,
    pub(super) limiter: Option<RateLimiter>,
    pub(super) credentials: RwLock<Option<AuthCredentials>>,
    pub(super) initialized: AtomicBool,
    /// Serializes initialize/destroy
    pub(super) lifecycle: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("name", &self.name)
            .field("provider", &self.backend.provider())
            .field("base_url", &self.config.base_url)
            .field("initialized", &self.is_initialized())
            .field("authenticated", &self.is_authenticated())
            .field("circuit_state", &self.breaker.state())
            .finish()
    }
}

/// Health report built from local state only
#[derive(Debug, Clone, Serialize)]
pub struct ClientHealth {
    pub healthy: bool,
    pub details: HealthDetails,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthDetails {
    pub client: String,
    pub provider: String,
    pub initialized: bool,
    pub authenticated: bool,
    pub has_handle: bool,
    pub circuit_breaker: CircuitBreakerStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limiter: Option<RateLimiterStats>,
}
