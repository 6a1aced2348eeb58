//! Configuration for Conduit clients
//!
//! `ClientConfig` is the plain-data description of one client. `Settings` layers a TOML
//! file and environment overrides over the built-in provider presets.

mod client;
pub mod loader;

pub use client::ClientConfig;
pub use loader::{ClientSettings, Settings, credentials_from_env};
