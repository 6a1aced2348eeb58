//! Value types describing an outbound call and the auth material it needs

mod credentials;
mod request;

pub use credentials::{AuthCredentials, CredentialKind};
pub use request::{ApiRequest, ApiResponse, HttpMethod, RawResponse, ResponseMetadata};
