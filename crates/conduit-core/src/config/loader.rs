//! Settings loading from file and environment
//!
//! Layers, lowest precedence first:
//! 1. Built-in entries for every known provider
//! 2. Optional TOML file
//! 3. `CONDUIT__…` environment variables (`CONDUIT__CLIENTS__SLACK__TIMEOUT=10s`)

use crate::config::ClientConfig;
use crate::error::{ConduitError, ConduitResult};
use crate::providers::ProviderKind;
use crate::recovery::{CircuitBreakerConfig, RateLimitConfig, RetryConfig};
use crate::types::AuthCredentials;
use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Environment prefix for overrides
pub const ENV_PREFIX: &str = "CONDUIT";

/// All configured clients, keyed by client name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub clients: BTreeMap<String, ClientSettings>,
}

/// Overrides for one client on top of its provider's preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSettings {
    pub provider: ProviderKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub circuit_breaker: Option<CircuitBreakerConfig>,
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,
}

fn default_enabled() -> bool {
    true
}

impl ClientSettings {
    pub fn for_provider(provider: ProviderKind) -> Self {
        Self {
            provider,
            enabled: true,
            base_url: None,
            timeout: None,
            retry: None,
            circuit_breaker: None,
            rate_limit: None,
            default_headers: BTreeMap::new(),
        }
    }

    /// Resolve into a full client config, overrides applied over the provider preset
    pub fn client_config(&self) -> ClientConfig {
        let mut config = self.provider.default_config();
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(retry) = &self.retry {
            config.retry = retry.clone();
        }
        if let Some(circuit_breaker) = &self.circuit_breaker {
            config.circuit_breaker = circuit_breaker.clone();
        }
        if let Some(rate_limit) = &self.rate_limit {
            config.rate_limit = Some(rate_limit.clone());
        }
        config
            .default_headers
            .extend(self.default_headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        config
    }
}

impl Settings {
    /// Settings with one enabled entry per known provider
    pub fn defaults() -> Self {
        let clients = ProviderKind::ALL
            .iter()
            .map(|kind| (kind.as_str().to_string(), ClientSettings::for_provider(*kind)))
            .collect();
        Self { clients }
    }

    /// Load from an optional file plus process environment
    pub fn load(path: Option<&Path>) -> ConduitResult<Self> {
        Self::load_with_env(path, Environment::with_prefix(ENV_PREFIX))
    }

    /// Load with a caller-supplied environment source
    pub fn load_with_env(path: Option<&Path>, env: Environment) -> ConduitResult<Self> {
        let mut builder = Config::builder();

        for kind in ProviderKind::ALL {
            builder = builder.set_default(format!("clients.{}.provider", kind.as_str()), kind.as_str())?;
        }

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConduitError::config_with_context(
                    format!("Settings file not found: {}", path.display()),
                    "Loading settings",
                ));
            }
            tracing::debug!(path = %path.display(), "Loading settings file");
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        builder = builder.add_source(env.separator("__").try_parsing(true));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> ConduitResult<()> {
        for (name, client) in &self.clients {
            client.client_config().validate().map_err(|e| {
                ConduitError::config_with_context(e.to_string(), format!("clients.{}", name))
            })?;
        }
        Ok(())
    }

    /// Enabled clients, in name order
    pub fn enabled_clients(&self) -> impl Iterator<Item = (&str, &ClientSettings)> {
        self.clients
            .iter()
            .filter(|(_, client)| client.enabled)
            .map(|(name, client)| (name.as_str(), client))
    }
}

/// Environment variable holding the credential for a provider
pub fn credential_env_var(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::Google => "GOOGLE_ACCESS_TOKEN",
        ProviderKind::OpenAi => "OPENAI_API_KEY",
        ProviderKind::Slack => "SLACK_BOT_TOKEN",
    }
}

/// Read a provider's credential from the process environment
pub fn credentials_from_env(provider: ProviderKind) -> Option<AuthCredentials> {
    credentials_from_lookup(provider, |name| std::env::var(name).ok())
}

/// Build a provider's credential from an arbitrary variable lookup
pub fn credentials_from_lookup<F>(provider: ProviderKind, lookup: F) -> Option<AuthCredentials>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(credential_env_var(provider)).filter(|v| !v.trim().is_empty())?;
    Some(match provider {
        ProviderKind::Google => AuthCredentials::oauth2(value),
        ProviderKind::OpenAi => AuthCredentials::api_key(value),
        ProviderKind::Slack => AuthCredentials::bearer(value),
    })
}
