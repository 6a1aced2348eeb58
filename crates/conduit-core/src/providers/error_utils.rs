//! Provider error helpers: sanitizing upstream error text and the mapping shared by all
//! providers.

use crate::client::ProviderError;
use crate::error::ApiClientError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

const MAX_ERROR_TEXT_CHARS: usize = 1_024;
const REDACTED: &str = "[REDACTED]";

static BEARER_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bBearer\s+[A-Za-z0-9._\-+/=]{8,}").expect("valid bearer token regex")
});

static KEY_VALUE_SECRET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(api[_-]?key|access[_-]?token|refresh[_-]?token|token|secret|password|authorization|x-api-key)\b\s*[:=]\s*["']?[^"',\s}]+"#,
    )
    .expect("valid key/value secret regex")
});

/// Slack and OpenAI token shapes that show up inside error messages
static RAW_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(xox[abposr]-[A-Za-z0-9-]{8,}|sk-[A-Za-z0-9_-]{12,}|ya29\.[A-Za-z0-9._-]{8,})")
        .expect("valid raw token regex")
});

/// Sanitize provider error text by redacting secrets and truncating large payloads.
pub fn sanitize_provider_error_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "<empty error response body>".to_string();
    }

    if let Ok(mut json) = serde_json::from_str::<Value>(trimmed) {
        redact_json_value(&mut json);
        let serialized =
            serde_json::to_string(&json).unwrap_or_else(|_| "<unserializable error>".to_string());
        return truncate_with_suffix(serialized);
    }

    let redacted = redact_inline_secrets(trimmed);
    truncate_with_suffix(redacted)
}

/// Sanitized rendering of a response body for error context
pub fn sanitize_body(body: &Value) -> String {
    match body {
        Value::String(text) => sanitize_provider_error_text(text),
        Value::Null => sanitize_provider_error_text(""),
        other => {
            let mut json = other.clone();
            redact_json_value(&mut json);
            truncate_with_suffix(json.to_string())
        }
    }
}

fn redact_json_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if is_sensitive_key(key) {
                    *val = Value::String(REDACTED.to_string());
                } else {
                    redact_json_value(val);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                redact_json_value(item);
            }
        }
        Value::String(s) => {
            *s = redact_inline_secrets(s);
        }
        _ => {}
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.to_ascii_lowercase().replace(['-', ' '], "_");
    normalized.contains("api_key")
        || normalized.contains("token")
        || normalized.contains("secret")
        || normalized.contains("password")
        || normalized.contains("authorization")
        || normalized.contains("cookie")
        || normalized.contains("private_key")
}

fn redact_inline_secrets(input: &str) -> String {
    let redacted_bearer = BEARER_TOKEN_RE.replace_all(input, "Bearer [REDACTED]");
    let redacted_pairs = KEY_VALUE_SECRET_RE.replace_all(&redacted_bearer, "$1=[REDACTED]");
    RAW_TOKEN_RE.replace_all(&redacted_pairs, REDACTED).into_owned()
}

fn truncate_with_suffix(input: String) -> String {
    let char_count = input.chars().count();
    if char_count <= MAX_ERROR_TEXT_CHARS {
        return input;
    }

    let truncated: String = input.chars().take(MAX_ERROR_TEXT_CHARS).collect();
    format!(
        "{}... [truncated {} chars]",
        truncated,
        char_count - MAX_ERROR_TEXT_CHARS
    )
}

/// `Retry-After` in delta-seconds form. HTTP-date values are ignored.
pub fn retry_after(headers: &HashMap<String, String>) -> Option<Duration> {
    headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("retry-after"))
        .and_then(|(_, value)| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Map failures that look the same for every provider.
///
/// Returns `None` for `Status` and `Api`, which need provider-specific reading.
pub fn map_common_error(provider: &str, error: &ProviderError) -> Option<ApiClientError> {
    let mapped = match error {
        ProviderError::Transport {
            message,
            timeout,
            connect,
        } => {
            let code = if *timeout {
                "TIMEOUT"
            } else if *connect {
                "CONNECTION_FAILED"
            } else {
                "NETWORK_ERROR"
            };
            ApiClientError::network(code, sanitize_provider_error_text(message))
        }
        ProviderError::Decode { status, message } => ApiClientError::unknown(
            "DECODE_ERROR",
            format!("Failed to decode {} response: {}", provider, message),
        )
        .with_status(*status),
        ProviderError::NotInitialized => ApiClientError::client_error(
            "CLIENT_NOT_INITIALIZED",
            format!("{} transport is not initialized", provider),
        ),
        ProviderError::Status { .. } | ProviderError::Api { .. } => return None,
    };
    Some(mapped.with_context("provider", provider))
}

/// Fallback classification of a bare HTTP status
pub fn status_error(provider: &str, status: u16, message: impl Into<String>) -> ApiClientError {
    let message = message.into();
    let error = match status {
        401 => ApiClientError::authentication("UNAUTHENTICATED", message),
        403 => ApiClientError::client_error("PERMISSION_DENIED", message),
        404 => ApiClientError::client_error("NOT_FOUND", message),
        429 => ApiClientError::rate_limited("RATE_LIMIT_EXCEEDED", message),
        500..=599 => ApiClientError::server_error(status, message),
        400..=499 => ApiClientError::client_error("INVALID_REQUEST", message),
        _ => ApiClientError::unknown("UNEXPECTED_STATUS", message),
    };
    error.with_status(status).with_context("provider", provider)
}

/// First non-empty string among JSON pointers into `body`
pub fn first_str<'a>(body: &'a Value, pointers: &[&str]) -> Option<&'a str> {
    pointers
        .iter()
        .filter_map(|pointer| body.pointer(pointer).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}
