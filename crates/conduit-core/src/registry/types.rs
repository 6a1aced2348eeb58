//! Registry type definitions

use crate::client::{ApiClient, ClientHealth};
use crate::config::ClientConfig;
use crate::error::{ApiClientError, ConduitResult};
use crate::types::AuthCredentials;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Builds a client from its registered name and effective config
pub type ClientConstructor =
    Arc<dyn Fn(&str, ClientConfig) -> ConduitResult<ApiClient> + Send + Sync>;

/// Supplies credentials for a freshly initialized client, if any are available
pub type CredentialResolver = Arc<dyn Fn(&ApiClient) -> Option<AuthCredentials> + Send + Sync>;

/// Aggregate health of every constructed client
#[derive(Debug, Clone, Serialize)]
pub struct RegistryHealth {
    /// True when every constructed client reports healthy
    pub healthy: bool,
    pub clients: BTreeMap<String, ClientHealth>,
    /// Registered but not yet constructed
    pub idle: Vec<String>,
}

/// Result of one client's connection probe
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionOutcome {
    pub name: String,
    pub ok: bool,
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub latency: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiClientError>,
}

impl ConnectionOutcome {
    pub(super) fn from_result(name: String, result: Result<Duration, ApiClientError>) -> Self {
        match result {
            Ok(latency) => Self {
                name,
                ok: true,
                latency: Some(latency),
                error: None,
            },
            Err(error) => Self {
                name,
                ok: false,
                latency: None,
                error: Some(error),
            },
        }
    }
}
