//! OpenAI REST API

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

const PROVIDER: &str = "openai";

/// OpenAI backend, authenticated with an API key
#[derive(Debug, Default)]
pub struct OpenAiBackend {
    transport: TransportSlot,
}

impl OpenAiBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `{"error": {"message": "...", "type": "...", "code": "..."}}`
    fn map_status(&self, status: u16, headers: &HashMap<String, String>, body: &Value) -> ApiClientError {
        let code = first_str(body, &["/error/code"]);
        let error_type = first_str(body, &["/error/type"]);
        let message = first_str(body, &["/error/message"])
            .map(str::to_string)
            .unwrap_or_else(|| format!("OpenAI API returned HTTP {}", status));

        let error = match (status, code.or(error_type)) {
            (_, Some("invalid_api_key")) | (401, _) => {
                ApiClientError::authentication("INVALID_API_KEY", message).with_status(status)
            }
            // Quota exhaustion does not clear up by retrying
            (429, Some("insufficient_quota")) => {
                ApiClientError::rate_limited("INSUFFICIENT_QUOTA", message)
                    .with_status(status)
                    .with_retryable(false)
            }
            (429, _) => ApiClientError::rate_limited("RATE_LIMIT_EXCEEDED", message)
                .with_status(status)
                .with_retry_after(retry_after(headers)),
            (400..=499, Some(code)) if status != 403 && status != 404 => {
                ApiClientError::client_error(code.to_ascii_uppercase(), message).with_status(status)
            }
            _ => status_error(PROVIDER, status, message),
        };

        let mut error = error
            .with_context("provider", PROVIDER)
            .with_context("response", sanitize_body(body));
        if let Some(error_type) = error_type {
            error = error.with_context("error_type", error_type);
        }
        error
    }
}

#[async_trait]
impl ProviderBackend for OpenAiBackend {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn accepted_credentials(&self) -> &'static [CredentialKind] {
        &[CredentialKind::ApiKey]
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
        ApiRequest::get("/models")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use serde_json::json;

    fn map(status: u16, body: Value) -> ApiClientError {
        OpenAiBackend::new().handle_api_error(
            ProviderError::Status {
                status,
                headers: HashMap::new(),
                body,
            },
            &ApiRequest::post("/chat/completions"),
        )
    }

    fn envelope(error_type: &str, code: Option<&str>) -> Value {
        json!({"error": {"message": "Request failed", "type": error_type, "code": code}})
    }

    #[test]
    fn test_invalid_api_key() {
        let err = map(401, envelope("invalid_request_error", Some("invalid_api_key")));
        assert_eq!(err.category, ErrorCategory::Authentication);
        assert_eq!(err.code, "INVALID_API_KEY");
        assert!(!err.retryable);
    }

    #[test]
    fn test_insufficient_quota_is_not_retryable() {
        let err = map(429, envelope("insufficient_quota", Some("insufficient_quota")));
        assert_eq!(err.category, ErrorCategory::RateLimit);
        assert_eq!(err.code, "INSUFFICIENT_QUOTA");
        assert!(!err.retryable);
    }

    #[test]
    fn test_plain_rate_limit_is_retryable() {
        let err = map(429, envelope("requests", Some("rate_limit_exceeded")));
        assert_eq!(err.category, ErrorCategory::RateLimit);
        assert!(err.retryable);
    }

    #[test]
    fn test_bad_request_keeps_upstream_code() {
        let err = map(400, envelope("invalid_request_error", Some("context_length_exceeded")));
        assert_eq!(err.category, ErrorCategory::ClientError);
        assert_eq!(err.code, "CONTEXT_LENGTH_EXCEEDED");
        assert_eq!(err.context.get("error_type").map(String::as_str), Some("invalid_request_error"));
    }

    #[test]
    fn test_server_error() {
        let err = map(500, envelope("server_error", None));
        assert_eq!(err.category, ErrorCategory::ServerError);
        assert!(err.retryable);
    }

    #[test]
    fn test_only_api_keys_accepted() {
        assert_eq!(OpenAiBackend::new().accepted_credentials(), &[CredentialKind::ApiKey]);
    }
}
