//! Shared HTTP transport for provider backends

use crate::client::ProviderError;
use crate::config::ClientConfig;
use crate::error::{ApiClientError, ApiResult};
use crate::types::{ApiRequest, HttpMethod, RawResponse};
use parking_lot::RwLock;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Header carrying the per-call request id
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP handle for one provider: a pooled client plus the base URL
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        for (key, value) in &config.default_headers {
            match (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(val)) => {
                    headers.insert(name, val);
                }
                _ => warn!(header = %key, "Skipping invalid default header"),
            }
        }

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(config.timeout))
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| {
                ApiClientError::unknown(
                    "INITIALIZATION_FAILED",
                    format!("Failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Absolute endpoints are used as-is; relative ones are appended to the base URL
    pub fn url_for(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
        }
    }

    /// Send one request. Credentials, when present, go out as a bearer token.
    ///
    /// Non-2xx responses come back as `ProviderError::Status` with the body parsed as JSON
    /// when possible and kept as a string otherwise.
    pub async fn send(
        &self,
        request: &ApiRequest,
        request_id: &str,
    ) -> Result<RawResponse, ProviderError> {
        let url = self.url_for(&request.endpoint);
        let mut builder = self
            .client
            .request(method(request.method), &url)
            .header(REQUEST_ID_HEADER, request_id);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(credentials) = &request.credentials {
            builder = builder.bearer_auth(credentials.secret());
        }
        if let Some(data) = &request.data {
            builder = builder.json(data);
        }

        debug!(method = %request.method, url = %url, "Sending request");
        let response = builder.send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect::<HashMap<_, _>>();
        let bytes = response.bytes().await?;
        let success = (200..300).contains(&status);

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(body) => body,
                Err(e) if success => {
                    return Err(ProviderError::Decode {
                        status,
                        message: e.to_string(),
                    });
                }
                Err(_) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
            }
        };

        if success {
            Ok(RawResponse {
                status,
                headers,
                body,
            })
        } else {
            Err(ProviderError::Status {
                status,
                headers,
                body,
            })
        }
    }
}

fn method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

/// Holder for a transport that exists between `on_initialize` and `on_destroy`
#[derive(Debug, Default)]
pub struct TransportSlot(RwLock<Option<HttpTransport>>);

impl TransportSlot {
    pub fn install(&self, config: &ClientConfig) -> ApiResult<()> {
        let transport = HttpTransport::new(config)?;
        *self.0.write() = Some(transport);
        Ok(())
    }

    pub fn clear(&self) {
        self.0.write().take();
    }

    pub fn is_installed(&self) -> bool {
        self.0.read().is_some()
    }

    /// Cheap clone of the current transport
    pub fn get(&self) -> Result<HttpTransport, ProviderError> {
        self.0.read().clone().ok_or(ProviderError::NotInitialized)
    }
}
