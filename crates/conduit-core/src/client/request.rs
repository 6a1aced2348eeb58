//! Request orchestration: limiter, breaker, retry loop, error normalization

use super::types::ApiClient;
use crate::recovery::instant_after;
use crate::error::{ApiClientError, ApiResult};
use crate::recovery::circuit_breaker::BreakerRejection;
use crate::recovery::rate_limiter::RateLimitError;
use crate::types::{ApiRequest, ApiResponse, AuthCredentials, RawResponse, ResponseMetadata};
use chrono::Utc;
use serde::de::DeserializeOwned;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

impl ApiClient {
    /// Send a request through the full resilience pipeline.
    ///
    /// Order of operations:
    /// 1. rate limiter admission (may queue)
    /// 2. circuit breaker admission
    /// 3. retry loop around the provider call, each attempt bounded by the breaker timeout
    /// 4. final outcome reported to the breaker
    ///
    /// `ClientConfig::timeout` bounds the whole sequence, queueing and backoff included.
    ///
    /// # Errors
    ///
    /// Every failure, local or upstream, is returned as a single categorized
    /// `ApiClientError` carrying `client` and `request_id` context.
    #[instrument(
        skip(self, request),
        fields(client = %self.name, method = %request.method, endpoint = %request.endpoint, request_id)
    )]
    pub async fn make_request(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        let started = Instant::now();
        let deadline = instant_after(started, self.config.timeout);

        self.dispatch(request, &request_id, started, deadline)
            .await
            .map_err(|e| {
                e.with_context("client", &self.name)
                    .with_context("request_id", &request_id)
            })
    }

    /// Send a request and decode the response body into `T`
    pub async fn make_request_as<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> ApiResult<ApiResponse<T>> {
        self.make_request(request).await?.into_typed()
    }

    async fn dispatch(
        &self,
        mut request: ApiRequest,
        request_id: &str,
        started: Instant,
        deadline: Instant,
    ) -> ApiResult<ApiResponse> {
        if !self.is_initialized() {
            return Err(ApiClientError::client_error(
                "CLIENT_NOT_INITIALIZED",
                format!("Client '{}' must be initialized before making requests", self.name),
            ));
        }

        request.credentials = self.resolve_credentials(&request)?;

        if let Some(limiter) = &self.limiter {
            limiter
                .acquire(deadline)
                .await
                .map_err(|e| self.rate_limit_error(e))?;
            if Instant::now() >= deadline {
                return Err(ApiClientError::timeout("DEADLINE_EXCEEDED", started.elapsed()).with_attempts(0));
            }
        }

        let permit = self
            .breaker
            .try_acquire()
            .map_err(|rejection| self.circuit_open_error(rejection))?;

        let outcome = self
            .execute_with_retry(&request, request_id, started, deadline)
            .await;

        match &outcome {
            Err(error) if error.counts_as_upstream_failure() => permit.failure(),
            _ => permit.success(),
        }

        let (raw, attempts) = outcome?;
        let execution_time = started.elapsed();
        debug!(
            status = raw.status,
            attempts,
            elapsed_ms = execution_time.as_millis() as u64,
            "Request completed"
        );

        Ok(ApiResponse {
            data: raw.body,
            status_code: raw.status,
            headers: raw.headers,
            metadata: ResponseMetadata {
                request_id: request_id.to_string(),
                timestamp: Utc::now(),
                execution_time,
                attempts,
                cached: false,
            },
        })
    }

    /// Per-call credentials win over stored ones; both are checked against the provider
    fn resolve_credentials(&self, request: &ApiRequest) -> ApiResult<Option<AuthCredentials>> {
        let credentials = match &request.credentials {
            Some(credentials) => Some(credentials.clone()),
            None => self.credentials.read().clone(),
        };

        match credentials {
            Some(credentials) => {
                self.check_credentials(&credentials)?;
                Ok(Some(credentials))
            }
            None if request.requires_auth => Err(ApiClientError::authentication(
                "NOT_AUTHENTICATED",
                format!(
                    "Client '{}' has no credentials; call authenticate() or pass credentials with the request",
                    self.name
                ),
            )),
            None => Ok(None),
        }
    }

    /// Run attempts until success, a non-retryable error, exhaustion, or the deadline.
    ///
    /// Returns the raw response with the number of attempts made.
    async fn execute_with_retry(
        &self,
        request: &ApiRequest,
        request_id: &str,
        started: Instant,
        deadline: Instant,
    ) -> ApiResult<(RawResponse, u32)> {
        let max_attempts = self.retry.config().max_attempts;
        let mut attempt = 0u32;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(
                    ApiClientError::timeout("DEADLINE_EXCEEDED", started.elapsed()).with_attempts(attempt)
                );
            }

            attempt += 1;
            // The overall deadline caps the per-attempt timeout
            let attempt_timeout = self.config.circuit_breaker.timeout.min(remaining);

            let error = match timeout(
                attempt_timeout,
                self.backend.perform_request(request, request_id),
            )
            .await
            {
                Ok(Ok(raw)) => {
                    if attempt > 1 {
                        debug!(attempt, "Request succeeded after retry");
                    }
                    return Ok((raw, attempt));
                }
                Ok(Err(provider_error)) => self.backend.handle_api_error(provider_error, request),
                Err(_) => ApiClientError::timeout("REQUEST_TIMEOUT", attempt_timeout),
            };

            if !self.retry.should_retry(&error, attempt) {
                if error.is_retryable() {
                    warn!(attempts = attempt, error = %error, "All retry attempts exhausted");
                } else {
                    debug!(error = %error, "Non-retryable error");
                }
                return Err(error.with_attempts(attempt));
            }

            let delay = self.retry.backoff_for(&error, attempt);
            if instant_after(Instant::now(), delay) >= deadline {
                warn!(
                    attempts = attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Next retry would exceed the request deadline"
                );
                return Err(ApiClientError::timeout("DEADLINE_EXCEEDED", started.elapsed())
                    .with_attempts(attempt)
                    .with_context("last_error_code", &error.code)
                    .with_context("last_error", &error.message));
            }

            warn!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying after failure"
            );
            sleep(delay).await;
        }
    }

    fn rate_limit_error(&self, error: RateLimitError) -> ApiClientError {
        match error {
            RateLimitError::Rejected { retry_in } => {
                ApiClientError::rate_limited("RATE_LIMITED", error.to_string())
                    .with_retry_after(Some(retry_in))
                    .with_context("source", "local")
            }
            RateLimitError::QueueTimeout { .. } => {
                ApiClientError::rate_limited("RATE_LIMIT_QUEUE_TIMEOUT", error.to_string())
                    .with_context("source", "local")
            }
        }
    }

    fn circuit_open_error(&self, rejection: BreakerRejection) -> ApiClientError {
        debug!(state = %rejection.state, "Circuit breaker rejected request");
        ApiClientError::circuit_open(&self.name)
            .with_retry_after(rejection.retry_in)
            .with_context("state", rejection.state)
    }
}
