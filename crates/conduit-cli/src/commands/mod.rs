//! CLI commands

pub mod health;
pub mod probe;
pub mod request;

use anyhow::Context;
use conduit_core::providers::{env_credential_resolver, register_from_settings};
use conduit_core::{ClientRegistry, Settings};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Registry with every enabled client from the settings, authenticated from the environment
pub fn build_registry(config: Option<&Path>) -> anyhow::Result<ClientRegistry> {
    let settings = Settings::load(config).with_context(|| match config {
        Some(path) => format!("Failed to load settings from {}", path.display()),
        None => "Failed to load default settings".to_string(),
    })?;

    let registry = ClientRegistry::new().with_credentials(env_credential_resolver());
    register_from_settings(&registry, &settings);
    debug!(clients = ?registry.registered_names(), "Registry ready");
    Ok(registry)
}

pub(crate) fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
