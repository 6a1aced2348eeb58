//! Conduit Core Library
//!
//! This crate provides the request lifecycle shared by every assistant integration
//! (Google, OpenAI, Slack): rate limiting, circuit breaking, retries with backoff,
//! timeouts, credential handling and error normalization, plus a registry of named
//! clients.

pub mod client;
pub mod config;
pub mod error;
pub mod providers;
pub mod recovery;
pub mod registry;
pub mod types;

// Re-export commonly used types
pub use client::{ApiClient, ClientHealth, ProviderBackend, ProviderError};
pub use config::{ClientConfig, Settings};
pub use error::{ApiClientError, ApiResult, ConduitError, ConduitResult, ErrorCategory};
pub use providers::ProviderKind;
pub use recovery::{CircuitBreakerConfig, CircuitState, RateLimitConfig, RetryConfig};
pub use registry::{ClientRegistry, ConnectionOutcome, RegistryHealth};
pub use types::*;
