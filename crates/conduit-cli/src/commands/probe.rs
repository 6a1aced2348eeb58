//! Connection probe command

use super::print_json;
use conduit_core::ClientRegistry;
use serde_json::json;
use tracing::warn;

pub async fn run(registry: &ClientRegistry) -> anyhow::Result<()> {
    for name in registry.registered_names() {
        if let Err(e) = registry.get_client(&name).await {
            warn!(client = %name, error = %e, "Skipping client that failed to build");
        }
    }

    let outcomes = registry.test_all_connections().await;
    let failed = outcomes.iter().filter(|outcome| !outcome.ok).count();
    print_json(&json!(outcomes))?;

    if failed > 0 {
        anyhow::bail!("{} of {} connection probes failed", failed, outcomes.len());
    }
    Ok(())
}
