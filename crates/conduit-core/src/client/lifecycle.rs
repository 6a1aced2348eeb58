//! Client lifecycle: initialize, authenticate, destroy, health

use super::types::{ApiClient, ClientHealth, HealthDetails};
use crate::error::{ApiClientError, ApiResult};
use crate::types::AuthCredentials;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

impl ApiClient {
    /// Build provider handles. Idempotent and safe to call concurrently; needs no
    /// credentials.
    pub async fn initialize(&self) -> ApiResult<()> {
        if self.is_initialized() {
            return Ok(());
        }

        let _guard = self.lifecycle.lock().await;
        if self.is_initialized() {
            return Ok(());
        }

        self.backend.on_initialize(&self.config).await.map_err(|e| {
            e.with_context("client", &self.name)
                .with_context("provider", self.backend.provider())
        })?;
        self.initialized.store(true, Ordering::Release);

        info!(client = %self.name, provider = self.backend.provider(), "Client initialized");
        Ok(())
    }

    /// Store credentials for later calls.
    ///
    /// # Errors
    ///
    /// Non-retryable `authentication` error `INVALID_CREDENTIAL_TYPE` when the provider does
    /// not accept this credential variant.
    pub fn authenticate(&self, credentials: AuthCredentials) -> ApiResult<()> {
        self.check_credentials(&credentials)?;
        debug!(client = %self.name, kind = %credentials.kind(), "Stored credentials");
        *self.credentials.write() = Some(credentials);
        Ok(())
    }

    pub(super) fn check_credentials(&self, credentials: &AuthCredentials) -> ApiResult<()> {
        let accepted = self.backend.accepted_credentials();
        if accepted.contains(&credentials.kind()) {
            return Ok(());
        }

        let expected = accepted
            .iter()
            .map(|kind| kind.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(ApiClientError::authentication(
            "INVALID_CREDENTIAL_TYPE",
            format!(
                "Client '{}' does not accept {} credentials (expected one of: {})",
                self.name,
                credentials.kind(),
                expected
            ),
        )
        .with_context("client", &self.name)
        .with_context("provider", self.backend.provider())
        .with_context("credential_type", credentials.kind()))
    }

    /// Release provider handles and stored credentials. Safe on a client that was never
    /// initialized. The client can be initialized again afterwards.
    pub async fn destroy(&self) {
        let _guard = self.lifecycle.lock().await;
        if self.initialized.swap(false, Ordering::AcqRel) {
            self.backend.on_destroy().await;
            info!(client = %self.name, "Client destroyed");
        }
        *self.credentials.write() = None;
    }

    /// Local health snapshot; makes no network call
    pub fn get_health(&self) -> ClientHealth {
        let initialized = self.is_initialized();
        let authenticated = self.is_authenticated();

        ClientHealth {
            healthy: initialized && authenticated,
            details: HealthDetails {
                client: self.name.clone(),
                provider: self.backend.provider().to_string(),
                initialized,
                authenticated,
                has_handle: self.backend.has_handle(),
                circuit_breaker: self.breaker_stats(),
                rate_limiter: self.limiter_stats(),
            },
        }
    }

    /// Send the provider's probe request through the full request path and report its
    /// latency
    pub async fn test_connection(&self) -> ApiResult<Duration> {
        let started = Instant::now();
        let probe = self.backend.connection_probe();
        self.make_request(probe).await?;
        let latency = started.elapsed();
        debug!(client = %self.name, latency_ms = latency.as_millis() as u64, "Connection test passed");
        Ok(latency)
    }
}
