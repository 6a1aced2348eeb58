//! API client construction

use super::backend::ProviderBackend;
use super::types::ApiClient;
use crate::config::ClientConfig;
use crate::error::{ConduitError, ConduitResult};
use crate::recovery::RetryPolicy;
use crate::recovery::circuit_breaker::CircuitBreaker;
use crate::recovery::rate_limiter::RateLimiter;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::debug;

impl ApiClient {
    /// Create a client. No I/O happens until `initialize`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` fails validation.
    pub fn new(
        name: impl Into<String>,
        config: ClientConfig,
        backend: Arc<dyn ProviderBackend>,
    ) -> ConduitResult<Self> {
        let name = name.into();

        config.validate().map_err(|e| {
            ConduitError::config_with_context(
                format!("Invalid client config: {}", e),
                format!("Validating configuration for client '{}'", name),
            )
        })?;

        let breaker = CircuitBreaker::with_config(name.clone(), config.circuit_breaker.clone());
        let limiter = config
            .rate_limit
            .clone()
            .map(|rate_limit| RateLimiter::new(name.clone(), rate_limit));
        let retry = RetryPolicy::new(config.retry.clone());

        debug!(
            client = %name,
            provider = backend.provider(),
            base_url = %config.base_url,
            rate_limited = limiter.is_some(),
            "Created API client"
        );

        Ok(Self {
            name,
            config,
            backend,
            retry,
            breaker,
            limiter,
            credentials: RwLock::new(None),
            initialized: AtomicBool::new(false),
            lifecycle: tokio::sync::Mutex::new(()),
        })
    }
}
