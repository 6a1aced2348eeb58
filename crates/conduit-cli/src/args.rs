//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use conduit_core::HttpMethod;
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "conduit")]
#[command(about = "Conduit - resilient API clients for Google, OpenAI and Slack")]
#[command(version)]
pub struct Cli {
    /// Settings file (TOML). Built-in provider defaults apply without one.
    #[arg(long, short, env = "CONDUIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build every enabled client and print its local health
    Health,

    /// Send each client's connection probe and report latency
    Probe,

    /// Send one request through a configured client
    Request {
        /// Client name from the settings file
        client: String,

        /// HTTP method
        method: HttpMethod,

        /// Endpoint relative to the client's base URL, or an absolute URL
        endpoint: String,

        /// Query parameter as KEY=VALUE (repeatable)
        #[arg(long = "query", short = 'q', value_parser = parse_key_val)]
        query: Vec<(String, String)>,

        /// JSON request body
        #[arg(long, short, value_parser = parse_json)]
        data: Option<Value>,

        /// Send without credentials
        #[arg(long)]
        no_auth: bool,
    },
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_command() {
        let cli = Cli::try_parse_from([
            "conduit",
            "-v",
            "request",
            "slack",
            "post",
            "/chat.postMessage",
            "-q",
            "limit=10",
            "--data",
            r#"{"text":"hi"}"#,
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Request {
                client,
                method,
                endpoint,
                query,
                data,
                no_auth,
            } => {
                assert_eq!(client, "slack");
                assert_eq!(method, HttpMethod::Post);
                assert_eq!(endpoint, "/chat.postMessage");
                assert_eq!(query, vec![("limit".to_string(), "10".to_string())]);
                assert_eq!(data.unwrap()["text"], "hi");
                assert!(!no_auth);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_rejects_malformed_query_and_body() {
        assert!(Cli::try_parse_from(["conduit", "request", "x", "GET", "/", "-q", "novalue"]).is_err());
        assert!(Cli::try_parse_from(["conduit", "request", "x", "GET", "/", "-d", "{"]).is_err());
        assert!(Cli::try_parse_from(["conduit", "request", "x", "TRACE", "/"]).is_err());
    }
}
