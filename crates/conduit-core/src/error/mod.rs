//! Error types for Conduit
//!
//! Two error families live here:
//! - `ApiClientError`: the single, categorized error that leaves `ApiClient::make_request`.
//!   Every provider failure, breaker rejection, limiter rejection and timeout is normalized
//!   into this shape.
//! - `ConduitError`: failures outside a request (configuration, registry lookups).

mod constructors;
mod types;

pub use types::{ApiClientError, ApiResult, ConduitError, ConduitResult, ErrorCategory};
