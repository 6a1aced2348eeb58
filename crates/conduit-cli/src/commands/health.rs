//! Health command

use super::print_json;
use conduit_core::ClientRegistry;
use serde_json::{Map, json};

/// Build every registered client, then print the registry's health report.
///
/// Clients that fail to build are listed under `errors` instead of aborting the report.
pub async fn run(registry: &ClientRegistry) -> anyhow::Result<()> {
    let mut errors = Map::new();
    for name in registry.registered_names() {
        if let Err(e) = registry.get_client(&name).await {
            errors.insert(name, json!(e.to_string()));
        }
    }

    let health = registry.get_health_status();
    let healthy = health.healthy && errors.is_empty();
    print_json(&json!({
        "healthy": healthy,
        "clients": health.clients,
        "idle": health.idle,
        "errors": errors,
    }))?;

    if !healthy {
        anyhow::bail!("one or more clients are unhealthy");
    }
    Ok(())
}
