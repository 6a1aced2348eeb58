//! Outbound request and normalized response types

use crate::error::{ApiClientError, ApiResult};
use crate::types::AuthCredentials;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// HTTP method of an outbound call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            other => Err(format!("Unsupported HTTP method: {}", other)),
        }
    }
}

/// Description of a single outbound API call
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    /// Path relative to the client's base URL, e.g. `/gmail/v1/users/me/messages`
    pub endpoint: String,
    pub query: Vec<(String, String)>,
    /// JSON body
    pub data: Option<Value>,
    pub headers: HashMap<String, String>,
    /// Per-call credentials; override the client's stored credentials
    pub credentials: Option<AuthCredentials>,
    pub requires_auth: bool,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            query: Vec::new(),
            data: None,
            headers: HashMap::new(),
            credentials: None,
            requires_auth: true,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, endpoint)
    }

    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, endpoint)
    }

    /// Append a query parameter
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set the JSON body
    pub fn with_json(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_credentials(mut self, credentials: AuthCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Mark the call as not needing credentials (public endpoints)
    pub fn without_auth(mut self) -> Self {
        self.requires_auth = false;
        self
    }
}

/// Raw answer from a provider backend, before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Value,
}

/// Per-call bookkeeping attached to every successful response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseMetadata {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(with = "humantime_serde")]
    pub execution_time: Duration,
    pub attempts: u32,
    pub cached: bool,
}

/// Normalized successful response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T = Value> {
    pub data: T,
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub metadata: ResponseMetadata,
}

impl ApiResponse<Value> {
    /// Deserialize the body into a typed payload
    pub fn into_typed<T: DeserializeOwned>(self) -> ApiResult<ApiResponse<T>> {
        let data = serde_json::from_value(self.data).map_err(|e| {
            ApiClientError::unknown("DECODE_ERROR", format!("Failed to decode response body: {}", e))
                .with_status(self.status_code)
                .with_context("request_id", &self.metadata.request_id)
        })?;
        Ok(ApiResponse {
            data,
            status_code: self.status_code,
            headers: self.headers,
            metadata: self.metadata,
        })
    }
}
