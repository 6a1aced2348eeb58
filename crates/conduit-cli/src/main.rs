//! Conduit CLI
//!
//! Health checks, connection probes and ad-hoc requests against the clients configured in
//! a Conduit settings file.
//!
//! ```bash
//! conduit --config conduit.toml health
//! conduit probe
//! conduit request slack POST /chat.postMessage --data '{"channel":"C123","text":"hi"}'
//! ```
//!
//! Credentials come from `GOOGLE_ACCESS_TOKEN`, `OPENAI_API_KEY` and `SLACK_BOT_TOKEN`.

mod args;
mod commands;
mod router;

use args::Cli;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; -v raises the default to debug
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    router::route(cli).await
}
