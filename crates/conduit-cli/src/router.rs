//! Command routing logic for CLI

use crate::args::{Cli, Commands};
use crate::commands;

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli) -> anyhow::Result<()> {
    let registry = commands::build_registry(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Health => commands::health::run(&registry).await,
        Commands::Probe => commands::probe::run(&registry).await,
        Commands::Request {
            client,
            method,
            endpoint,
            query,
            data,
            no_auth,
        } => {
            let request = commands::request::RequestArgs {
                method,
                endpoint,
                query,
                data,
                no_auth,
            };
            commands::request::run(&registry, &client, request).await
        }
    };

    registry.destroy_all().await;
    result
}
