//! Slack Web API
//!
//! Slack answers most failures with HTTP 200 and `{"ok": false, "error": "<code>"}`, so
//! the body is inspected before a response counts as a success.

use super::error_utils::{map_common_error, retry_after, sanitize_body, status_error};
use super::http::TransportSlot;
use crate::client::{ProviderBackend, ProviderError};
use crate::config::ClientConfig;
use crate::error::{ApiClientError, ApiResult, ErrorCategory};
use crate::types::{ApiRequest, CredentialKind, RawResponse};
use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

const PROVIDER: &str = "slack";

const AUTH_ERRORS: &[&str] = &[
    "invalid_auth",
    "not_authed",
    "token_revoked",
    "token_expired",
    "account_inactive",
];

const SERVER_ERRORS: &[&str] = &[
    "internal_error",
    "fatal_error",
    "service_unavailable",
    "request_timeout",
];

/// Slack backend, authenticated with a bot or user token
#[derive(Debug, Default)]
pub struct SlackBackend {
    transport: TransportSlot,
}

impl SlackBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn an `ok: false` body into a provider error
    fn check_envelope(raw: RawResponse) -> Result<RawResponse, ProviderError> {
        if raw.body.get("ok").and_then(Value::as_bool) != Some(false) {
            return Ok(raw);
        }

        let code = raw
            .body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown_error")
            .to_string();
        let message = raw
            .body
            .pointer("/response_metadata/messages")
            .and_then(Value::as_array)
            .map(|messages| {
                messages
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("Slack API error: {}", code));

        Err(ProviderError::Api {
            status: raw.status,
            code,
            message,
            headers: raw.headers,
        })
    }

    fn map_slack_code(code: &str, message: String) -> ApiClientError {
        let upper = code.to_ascii_uppercase();
        if AUTH_ERRORS.contains(&code) {
            ApiClientError::authentication(upper, message)
        } else if code == "ratelimited" {
            ApiClientError::rate_limited("RATE_LIMITED", message)
        } else if SERVER_ERRORS.contains(&code) {
            ApiClientError::new(ErrorCategory::ServerError, upper, message)
        } else {
            ApiClientError::client_error(upper, message)
        }
    }
}

#[async_trait]
impl ProviderBackend for SlackBackend {
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
        let raw = self.transport.get()?.send(request, request_id).await?;
        Self::check_envelope(raw)
    }

    fn handle_api_error(&self, error: ProviderError, request: &ApiRequest) -> ApiClientError {
        if let Some(mapped) = map_common_error(PROVIDER, &error) {
            return mapped.with_context("endpoint", &request.endpoint);
        }
        let mapped = match error {
            ProviderError::Api {
                status,
                code,
                message,
                headers,
            } => {
                let mut mapped = Self::map_slack_code(&code, message)
                    .with_context("slack_error", &code)
                    .with_context("provider", PROVIDER);
                if mapped.status_code.is_none() {
                    mapped = mapped.with_status(status);
                }
                if code == "ratelimited" {
                    mapped = mapped.with_retry_after(retry_after(&headers));
                }
                mapped
            }
            ProviderError::Status {
                status,
                headers,
                body,
            } => {
                // HTTP-level 429 carries Retry-After; other statuses use the generic mapping
                let code = body.get("error").and_then(Value::as_str);
                let base = match code {
                    Some(code) if status != 429 => Self::map_slack_code(code, format!("Slack API error: {}", code))
                        .with_status(status)
                        .with_context("slack_error", code)
                        .with_context("provider", PROVIDER),
                    _ => status_error(PROVIDER, status, format!("Slack API returned HTTP {}", status)),
                };
                base.with_retry_after(retry_after(&headers))
                    .with_context("response", sanitize_body(&body))
            }
            other => ApiClientError::unknown("UNKNOWN", other.to_string()),
        };
        mapped.with_context("endpoint", &request.endpoint)
    }

    fn connection_probe(&self) -> ApiRequest {
        ApiRequest::post("/auth.test")
    }
}
