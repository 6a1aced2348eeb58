//! Google REST APIs (Gmail, Calendar, People)

use super::error_utils::{first_str, map_common_error, retry_after, sanitize_body, status_error};
use super::http::TransportSlot;
use crate::client::{ProviderBackend, ProviderError};
use crate::config::ClientConfig;
use crate::error::{ApiClientError, ApiResult};
use crate::types::{ApiRequest, CredentialKind, RawResponse};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tracing::instrument;

const PROVIDER: &str = "google";

/// Error reasons Google reports on 403 when a quota, not a permission, is the problem
const RATE_LIMIT_REASONS: &[&str] = &["rateLimitExceeded", "userRateLimitExceeded"];

/// Google backend. Expects OAuth2 access tokens obtained elsewhere.
#[derive(Debug, Default)]
pub struct GoogleBackend {
    transport: TransportSlot,
}

impl GoogleBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a Google error envelope:
    /// `{"error": {"code": 403, "message": "...", "status": "PERMISSION_DENIED", "errors": [{"reason": "..."}]}}`
    fn map_status(&self, status: u16, headers: &HashMap<String, String>, body: &Value) -> ApiClientError {
        let google_status = first_str(body, &["/error/status"]);
        let message = first_str(body, &["/error/message", "/error_description", "/error"])
            .map(str::to_string)
            .unwrap_or_else(|| format!("Google API returned HTTP {}", status));
        let reasons: Vec<&str> = body
            .pointer("/error/errors")
            .and_then(Value::as_array)
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|e| e.get("reason").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default();
        let quota_exceeded = reasons.iter().any(|r| RATE_LIMIT_REASONS.contains(r));

        let error = if status == 401 || google_status == Some("UNAUTHENTICATED") {
            ApiClientError::authentication("UNAUTHENTICATED", message).with_status(status)
        } else if status == 429 || (status == 403 && quota_exceeded) {
            ApiClientError::rate_limited("RATE_LIMIT_EXCEEDED", message)
                .with_status(status)
                .with_retry_after(retry_after(headers))
        } else if status == 403 {
            ApiClientError::client_error("PERMISSION_DENIED", message).with_status(status)
        } else {
            status_error(PROVIDER, status, message)
        };

        let mut error = error
            .with_context("provider", PROVIDER)
            .with_context("response", sanitize_body(body));
        if let Some(google_status) = google_status {
            error = error.with_context("google_status", google_status);
        }
        if !reasons.is_empty() {
            error = error.with_context("reasons", reasons.join(","));
        }
        error
    }
}

#[async_trait]
impl ProviderBackend for GoogleBackend {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn accepted_credentials(&self) -> &'static [CredentialKind] {
        &[CredentialKind::OAuth2, CredentialKind::Bearer]
    }

    async fn on_initialize(&self, config: &ClientConfig) -> ApiResult<()> {
        self.transport.install(config)
    }

    async fn on_destroy(&self) {
        self.transport.clear();
    }

    fn has_handle(&self) -> bool {
        self.transport.is_installed()
    }

    #[instrument(skip(self, request), level = "debug")]
    async fn perform_request(
        &self,
        request: &ApiRequest,
        request_id: &str,
    ) -> Result<RawResponse, ProviderError> {
        self.transport.get()?.send(request, request_id).await
    }

    fn handle_api_error(&self, error: ProviderError, request: &ApiRequest) -> ApiClientError {
        if let Some(mapped) = map_common_error(PROVIDER, &error) {
            return mapped.with_context("endpoint", &request.endpoint);
        }
        let mapped = match error {
            ProviderError::Status {
                status,
                headers,
                body,
            } => self.map_status(status, &headers, &body),
            other => ApiClientError::unknown("UNKNOWN", other.to_string()),
        };
        mapped.with_context("endpoint", &request.endpoint)
    }

    fn connection_probe(&self) -> ApiRequest {
        ApiRequest::get("/oauth2/v2/userinfo")
    }
}
