//! Provider capability trait
//!
//! `ApiClient` owns the request lifecycle; a `ProviderBackend` only knows how to talk to
//! one upstream and how to read its failures.

use crate::config::ClientConfig;
use crate::error::{ApiClientError, ApiResult};
use crate::types::{ApiRequest, CredentialKind, RawResponse};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Raw failure from a provider, before classification.
///
/// Never leaves the crate boundary: `ProviderBackend::handle_api_error` turns it into an
/// `ApiClientError`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Non-success HTTP status
    #[error("HTTP {status}")]
    Status {
        status: u16,
        headers: HashMap<String, String>,
        body: Value,
    },

    /// Error reported in-band by a successful HTTP response
    #[error("API error {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        headers: HashMap<String, String>,
    },

    /// Request never produced a response
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        timeout: bool,
        connect: bool,
    },

    /// Response body could not be read
    #[error("Failed to decode response (HTTP {status}): {message}")]
    Decode { status: u16, message: String },

    /// Backend used before `on_initialize` or after `on_destroy`
    #[error("Provider handle not initialized")]
    NotInitialized,
}

impl ProviderError {
    /// HTTP status, when a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Api { status, .. } | Self::Decode { status, .. } => {
                Some(*status)
            }
            Self::Transport { .. } | Self::NotInitialized => None,
        }
    }

    pub fn headers(&self) -> Option<&HashMap<String, String>> {
        match self {
            Self::Status { headers, .. } | Self::Api { headers, .. } => Some(headers),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decode {
                status: err.status().map(|s| s.as_u16()).unwrap_or(0),
                message: err.to_string(),
            };
        }
        Self::Transport {
            message: err.to_string(),
            timeout: err.is_timeout(),
            connect: err.is_connect(),
        }
    }
}

/// What one upstream provider must supply to the shared request lifecycle
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderBackend: Send + Sync {
    /// Provider identifier used in logs and error context
    fn provider(&self) -> &'static str;

    /// Credential variants this provider accepts
    fn accepted_credentials(&self) -> &'static [CredentialKind];

    /// Build provider handles. Called once per successful `ApiClient::initialize`.
    async fn on_initialize(&self, config: &ClientConfig) -> ApiResult<()>;

    /// Drop provider handles
    async fn on_destroy(&self);

    /// Whether provider handles currently exist
    fn has_handle(&self) -> bool;

    /// Execute one attempt against the upstream.
    ///
    /// `request.credentials` holds the resolved credentials, already checked against
    /// `accepted_credentials`.
    async fn perform_request(
        &self,
        request: &ApiRequest,
        request_id: &str,
    ) -> Result<RawResponse, ProviderError>;

    /// Classify a raw failure
    fn handle_api_error(&self, error: ProviderError, request: &ApiRequest) -> ApiClientError;

    /// Cheap request proving connectivity and credentials
    fn connection_probe(&self) -> ApiRequest;
}
