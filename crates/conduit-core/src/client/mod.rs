//! Base API client
//!
//! One request lifecycle shared by every provider: rate limiting, circuit breaking,
//! retries with exponential backoff, timeouts, and normalization of every failure into
//! `ApiClientError`. Providers plug in through `ProviderBackend`.

mod accessors;
mod backend;
mod constructor;
mod lifecycle;
mod request;
mod types;

#[cfg(test)]
pub use backend::MockProviderBackend;
pub use backend::{ProviderBackend, ProviderError};
pub use types::{ApiClient, ClientHealth, HealthDetails};
