//! Tests for the client registry

use super::*;
use crate::client::{ApiClient, ProviderBackend, ProviderError};
use crate::config::ClientConfig;
use crate::error::{ApiClientError, ApiResult, ConduitError, ConduitResult, ErrorCategory};
use crate::types::{ApiRequest, AuthCredentials, CredentialKind, RawResponse};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

/// Upstream that answers the probe with 200 or a non-retryable 404
struct FakeBackend {
    reachable: bool,
    handle: AtomicBool,
}

#[async_trait]
impl ProviderBackend for FakeBackend {
    fn provider(&self) -> &'static str {
        "fake"
    }

    fn accepted_credentials(&self) -> &'static [CredentialKind] {
        &[CredentialKind::Bearer]
    }

    async fn on_initialize(&self, _config: &ClientConfig) -> ApiResult<()> {
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.handle.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn on_destroy(&self) {
        self.handle.store(false, Ordering::SeqCst);
    }

    fn has_handle(&self) -> bool {
        self.handle.load(Ordering::SeqCst)
    }

    async fn perform_request(
        &self,
        _request: &ApiRequest,
        _request_id: &str,
    ) -> Result<RawResponse, ProviderError> {
        if self.reachable {
            Ok(RawResponse {
                status: 200,
                headers: HashMap::new(),
                body: json!({"ok": true}),
            })
        } else {
            Err(ProviderError::Status {
                status: 404,
                headers: HashMap::new(),
                body: json!({"error": "missing"}),
            })
        }
    }

    fn handle_api_error(&self, error: ProviderError, _request: &ApiRequest) -> ApiClientError {
        let status = error.status().unwrap_or(0);
        ApiClientError::from_status(status, "UPSTREAM_ERROR", error.to_string())
    }

    fn connection_probe(&self) -> ApiRequest {
        ApiRequest::get("/whoami")
    }
}

fn counting_constructor(reachable: bool, builds: Arc<AtomicU32>) -> ClientConstructor {
    Arc::new(move |name: &str, config: ClientConfig| -> ConduitResult<ApiClient> {
        builds.fetch_add(1, Ordering::SeqCst);
        let backend = Arc::new(FakeBackend {
            reachable,
            handle: AtomicBool::new(false),
        });
        ApiClient::new(name, config, backend)
    })
}

fn config() -> ClientConfig {
    ClientConfig::new("https://fake.test")
}

fn bearer_resolver() -> CredentialResolver {
    Arc::new(|_client: &ApiClient| Some(AuthCredentials::bearer("test-token")))
}

#[tokio::test]
async fn test_unknown_name_is_not_registered() {
    let registry = ClientRegistry::new();
    let err = registry.get_client("missing").await.unwrap_err();
    assert!(matches!(err, ConduitError::NotRegistered { ref name } if name == "missing"));
}

#[tokio::test]
async fn test_registration_is_lazy() {
    let builds = Arc::new(AtomicU32::new(0));
    let registry = ClientRegistry::new();
    registry.register_client("fake", counting_constructor(true, builds.clone()), config());

    assert!(registry.is_registered("fake"));
    assert!(!registry.is_constructed("fake"));
    assert_eq!(builds.load(Ordering::SeqCst), 0);

    let first = registry.get_client("fake").await.unwrap();
    let second = registry.get_client("fake").await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.is_initialized());
    assert!(registry.is_constructed("fake"));
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_first_lookups_build_once() {
    let builds = Arc::new(AtomicU32::new(0));
    let registry = Arc::new(ClientRegistry::new());
    registry.register_client("fake", counting_constructor(true, builds.clone()), config());

    let lookups = (0..5).map(|_| {
        let registry = registry.clone();
        tokio::spawn(async move { registry.get_client("fake").await })
    });
    let clients: Vec<_> = futures::future::join_all(lookups)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(clients.iter().all(|c| Arc::ptr_eq(c, &clients[0])));
}

#[tokio::test]
async fn test_override_applies_only_to_first_construction() {
    let registry = ClientRegistry::new();
    registry.register_client("fake", counting_constructor(true, Arc::default()), config());

    let overridden = config().with_timeout(Duration::from_secs(5));
    let client = registry.get_client_with("fake", Some(overridden)).await.unwrap();
    assert_eq!(client.config().timeout, Duration::from_secs(5));

    let ignored = config().with_timeout(Duration::from_secs(9));
    let client = registry.get_client_with("fake", Some(ignored)).await.unwrap();
    assert_eq!(client.config().timeout, Duration::from_secs(5));
}

#[tokio::test]
async fn test_invalid_config_is_not_cached() {
    let builds = Arc::new(AtomicU32::new(0));
    let registry = ClientRegistry::new();
    registry.register_client(
        "fake",
        counting_constructor(true, builds.clone()),
        ClientConfig::new("not a url"),
    );

    let err = registry.get_client("fake").await.unwrap_err();
    assert!(matches!(err, ConduitError::Config { .. }));
    assert!(!registry.is_constructed("fake"));

    let client = registry.get_client_with("fake", Some(config())).await.unwrap();
    assert_eq!(client.config().base_url, "https://fake.test");
    assert_eq!(builds.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_reregistering_replaces_instance() {
    let registry = ClientRegistry::new();
    registry.register_client("fake", counting_constructor(true, Arc::default()), config());
    let old = registry.get_client("fake").await.unwrap();

    registry.register_client(
        "fake",
        counting_constructor(true, Arc::default()),
        config().with_timeout(Duration::from_secs(3)),
    );
    assert!(!registry.is_constructed("fake"));

    let new = registry.get_client("fake").await.unwrap();
    assert!(!Arc::ptr_eq(&old, &new));
    assert_eq!(new.config().timeout, Duration::from_secs(3));
    // The replaced instance still works for whoever holds it
    assert!(old.is_initialized());
}

#[tokio::test]
async fn test_unauthenticated_client_is_distinct_from_unregistered() {
    let registry = ClientRegistry::new();
    registry.register_client("fake", counting_constructor(true, Arc::default()), config());

    let client = registry.get_client("fake").await.unwrap();
    assert!(!client.is_authenticated());

    let err = client.make_request(ApiRequest::get("/items")).await.unwrap_err();
    assert_eq!(err.category, ErrorCategory::Authentication);
    assert_eq!(err.code, "NOT_AUTHENTICATED");
}

#[tokio::test]
async fn test_resolver_authenticates_new_clients() {
    let registry = ClientRegistry::new().with_credentials(bearer_resolver());
    registry.register_client("fake", counting_constructor(true, Arc::default()), config());

    let client = registry.get_client("fake").await.unwrap();
    assert!(client.is_authenticated());
    assert!(client.make_request(ApiRequest::get("/items")).await.is_ok());
}

#[tokio::test]
async fn test_client_debug_hides_credentials() {
    let registry = ClientRegistry::new().with_credentials(bearer_resolver());
    registry.register_client("fake", counting_constructor(true, Arc::default()), config());

    let rendered = format!("{:?}", registry.get_client("fake").await.unwrap());
    assert!(rendered.contains("\"fake\""));
    assert!(rendered.contains("authenticated: true"));
    assert!(!rendered.contains("test-token"));
}

#[tokio::test]
async fn test_rejected_credentials_fail_construction() {
    let resolver: CredentialResolver =
        Arc::new(|_client: &ApiClient| Some(AuthCredentials::api_key("sk-test")));
    let registry = ClientRegistry::new().with_credentials(resolver);
    registry.register_client("fake", counting_constructor(true, Arc::default()), config());

    match registry.get_client("fake").await.unwrap_err() {
        ConduitError::Client(err) => assert_eq!(err.code, "INVALID_CREDENTIAL_TYPE"),
        other => panic!("unexpected {:?}", other),
    }
    assert!(!registry.is_constructed("fake"));
}

#[tokio::test]
async fn test_health_status_covers_constructed_and_idle() {
    let registry = ClientRegistry::new().with_credentials(bearer_resolver());
    registry.register_client("built", counting_constructor(true, Arc::default()), config());
    registry.register_client("idle", counting_constructor(true, Arc::default()), config());

    registry.get_client("built").await.unwrap();
    let health = registry.get_health_status();

    assert!(health.healthy);
    assert_eq!(health.clients.len(), 1);
    assert!(health.clients["built"].details.has_handle);
    assert_eq!(health.idle, vec!["idle".to_string()]);
    assert!(!registry.is_constructed("idle"));
}

#[tokio::test]
async fn test_health_reports_unauthenticated_client() {
    let registry = ClientRegistry::new();
    registry.register_client("fake", counting_constructor(true, Arc::default()), config());
    registry.get_client("fake").await.unwrap();

    let health = registry.get_health_status();
    assert!(!health.healthy);
    assert!(!health.clients["fake"].details.authenticated);
}

#[tokio::test]
async fn test_connection_failures_do_not_abort_aggregate() {
    let registry = ClientRegistry::new().with_credentials(bearer_resolver());
    registry.register_client("up", counting_constructor(true, Arc::default()), config());
    registry.register_client("down", counting_constructor(false, Arc::default()), config());
    registry.register_client("idle", counting_constructor(true, Arc::default()), config());
    registry.get_client("up").await.unwrap();
    registry.get_client("down").await.unwrap();

    let outcomes = registry.test_all_connections().await;
    assert_eq!(outcomes.len(), 2);

    let down = outcomes.iter().find(|o| o.name == "down").unwrap();
    assert!(!down.ok);
    assert_eq!(down.error.as_ref().map(|e| e.status_code), Some(Some(404)));

    let up = outcomes.iter().find(|o| o.name == "up").unwrap();
    assert!(up.ok);
    assert!(up.latency.is_some());
    assert!(up.error.is_none());
}

#[tokio::test]
async fn test_destroy_all_forgets_instances() {
    let builds = Arc::new(AtomicU32::new(0));
    let registry = ClientRegistry::new().with_credentials(bearer_resolver());
    registry.register_client("fake", counting_constructor(true, builds.clone()), config());

    let old = registry.get_client("fake").await.unwrap();
    registry.destroy_all().await;

    assert!(!old.is_initialized());
    assert!(!old.is_authenticated());
    assert!(!registry.is_constructed("fake"));
    assert_eq!(registry.registered_names(), vec!["fake"]);

    let new = registry.get_client("fake").await.unwrap();
    assert!(new.is_initialized());
    assert_eq!(builds.load(Ordering::SeqCst), 2);
}
