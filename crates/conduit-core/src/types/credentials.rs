//! Authentication material supplied per call or via `ApiClient::authenticate`

use serde::{Deserialize, Serialize};
use std::fmt;

/// Credential variant tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    #[serde(rename = "oauth2")]
    OAuth2,
    Bearer,
    ApiKey,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OAuth2 => "oauth2",
            Self::Bearer => "bearer",
            Self::ApiKey => "api_key",
        };
        f.write_str(name)
    }
}

/// Credentials forwarded to a provider.
///
/// Token refresh happens upstream of this crate; the framework only checks that the
/// variant matches what the provider accepts and forwards the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthCredentials {
    #[serde(rename = "oauth2")]
    OAuth2 {
        access_token: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        refresh_token: Option<String>,
    },
    Bearer {
        access_token: String,
    },
    ApiKey {
        api_key: String,
    },
}

impl AuthCredentials {
    pub fn oauth2(access_token: impl Into<String>) -> Self {
        Self::OAuth2 {
            access_token: access_token.into(),
            refresh_token: None,
        }
    }

    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self::Bearer {
            access_token: access_token.into(),
        }
    }

    pub fn api_key(api_key: impl Into<String>) -> Self {
        Self::ApiKey {
            api_key: api_key.into(),
        }
    }

    pub fn kind(&self) -> CredentialKind {
        match self {
            Self::OAuth2 { .. } => CredentialKind::OAuth2,
            Self::Bearer { .. } => CredentialKind::Bearer,
            Self::ApiKey { .. } => CredentialKind::ApiKey,
        }
    }

    /// The secret sent on the wire
    pub fn secret(&self) -> &str {
        match self {
            Self::OAuth2 { access_token, .. } | Self::Bearer { access_token } => access_token,
            Self::ApiKey { api_key } => api_key,
        }
    }
}

impl fmt::Debug for AuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OAuth2 { refresh_token, .. } => f
                .debug_struct("OAuth2")
                .field("access_token", &"[REDACTED]")
                .field("refresh_token", &refresh_token.as_ref().map(|_| "[REDACTED]"))
                .finish(),
            Self::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("access_token", &"[REDACTED]")
                .finish(),
            Self::ApiKey { .. } => f
                .debug_struct("ApiKey")
                .field("api_key", &"[REDACTED]")
                .finish(),
        }
    }
}
