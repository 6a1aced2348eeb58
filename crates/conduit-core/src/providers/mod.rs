//! Provider backends
//!
//! Each provider implements `ProviderBackend` on top of the shared `HttpTransport` and maps
//! its own error envelopes into `ApiClientError`.

pub mod error_utils;
mod google;
mod http;
mod openai;
mod slack;

pub use google::GoogleBackend;
pub use http::{HttpTransport, REQUEST_ID_HEADER, TransportSlot};
pub use openai::OpenAiBackend;
pub use slack::SlackBackend;

use crate::client::{ApiClient, ProviderBackend};
use crate::config::{ClientConfig, Settings, credentials_from_env};
use crate::error::ConduitResult;
use crate::registry::{ClientConstructor, ClientRegistry, CredentialResolver};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Known upstream providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Google,
    #[serde(rename = "openai")]
    OpenAi,
    Slack,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::Google, Self::OpenAi, Self::Slack];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::OpenAi => "openai",
            Self::Slack => "slack",
        }
    }

    /// Inverse of `as_str`
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Built-in client preset for this provider
    pub fn default_config(&self) -> ClientConfig {
        match self {
            Self::Google => ClientConfig::for_google(),
            Self::OpenAi => ClientConfig::for_openai(),
            Self::Slack => ClientConfig::for_slack(),
        }
    }

    /// Fresh backend instance
    pub fn backend(&self) -> Arc<dyn ProviderBackend> {
        match self {
            Self::Google => Arc::new(GoogleBackend::new()),
            Self::OpenAi => Arc::new(OpenAiBackend::new()),
            Self::Slack => Arc::new(SlackBackend::new()),
        }
    }

    /// Registry recipe building a client backed by this provider
    pub fn constructor(&self) -> ClientConstructor {
        let kind = *self;
        Arc::new(move |name: &str, config: ClientConfig| -> ConduitResult<ApiClient> {
            ApiClient::new(name, config, kind.backend())
        })
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Register every enabled client from `settings`
pub fn register_from_settings(registry: &ClientRegistry, settings: &Settings) {
    for (name, client) in settings.enabled_clients() {
        registry.register_client(name, client.provider.constructor(), client.client_config());
    }
}

/// Credentials read from each provider's environment variable when a client is built
pub fn env_credential_resolver() -> CredentialResolver {
    Arc::new(|client: &ApiClient| {
        ProviderKind::from_name(client.provider()).and_then(credentials_from_env)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_names_round_trip_through_serde() {
        for kind in ProviderKind::ALL {
            let encoded = serde_json::to_string(&kind).unwrap();
            assert_eq!(encoded, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(ProviderKind::from_name("openai"), Some(ProviderKind::OpenAi));
        assert_eq!(ProviderKind::from_name("github"), None);
    }

    #[test]
    fn test_backends_match_kind() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.backend().provider(), kind.as_str());
        }
    }

    #[test]
    fn test_register_from_settings_skips_disabled() {
        let mut settings = Settings::defaults();
        if let Some(openai) = settings.clients.get_mut("openai") {
            openai.enabled = false;
        }

        let registry = ClientRegistry::new();
        register_from_settings(&registry, &settings);

        assert_eq!(registry.registered_names(), vec!["google", "slack"]);
    }
}
