//! Registry implementation

use super::types::{ClientConstructor, ConnectionOutcome, CredentialResolver, RegistryHealth};
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::{ConduitError, ConduitResult};
use futures::future::join_all;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// A registered recipe and its lazily built instance
struct Entry {
    constructor: ClientConstructor,
    config: ClientConfig,
    instance: OnceCell<Arc<ApiClient>>,
}

impl Entry {
    fn new(constructor: ClientConstructor, config: ClientConfig) -> Self {
        Self {
            constructor,
            config,
            instance: OnceCell::new(),
        }
    }

    /// Same recipe, no instance
    fn fresh(&self) -> Self {
        Self::new(self.constructor.clone(), self.config.clone())
    }
}

/// Registry of named clients.
///
/// Lookups clone an `Arc` to the entry under a short read lock, so construction and
/// initialization never run while the map is locked. Concurrent first lookups of the same
/// name share one construction.
#[derive(Default)]
pub struct ClientRegistry {
    entries: RwLock<BTreeMap<String, Arc<Entry>>>,
    credentials: Option<CredentialResolver>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authenticate each client with `resolver` right after it is initialized
    pub fn with_credentials(mut self, resolver: CredentialResolver) -> Self {
        self.credentials = Some(resolver);
        self
    }

    /// Store a recipe under `name` without building anything.
    ///
    /// Registering an existing name replaces its recipe and drops the cached instance;
    /// callers still holding the old `Arc<ApiClient>` keep a working client.
    pub fn register_client(
        &self,
        name: impl Into<String>,
        constructor: ClientConstructor,
        config: ClientConfig,
    ) {
        let name = name.into();
        let previous = self
            .entries
            .write()
            .insert(name.clone(), Arc::new(Entry::new(constructor, config)));
        match previous {
            Some(_) => debug!(client = %name, "Replaced client registration"),
            None => debug!(client = %name, "Registered client"),
        }
    }

    /// Cached client for `name`, built and initialized on first use
    pub async fn get_client(&self, name: &str) -> ConduitResult<Arc<ApiClient>> {
        self.get_client_with(name, None).await
    }

    /// Like `get_client`, but `config_override` replaces the registered config when this
    /// call is the one that builds the client. It is ignored once an instance exists.
    ///
    /// # Errors
    ///
    /// - `ConduitError::NotRegistered` for an unknown name
    /// - `ConduitError::Config` when the effective config is invalid
    /// - `ConduitError::Client` when initialization or authentication fails
    ///
    /// A failed build leaves nothing cached, so a later call tries again.
    pub async fn get_client_with(
        &self,
        name: &str,
        config_override: Option<ClientConfig>,
    ) -> ConduitResult<Arc<ApiClient>> {
        let entry = self.entry(name)?;
        let client = entry
            .instance
            .get_or_try_init(|| self.build(name, &entry, config_override))
            .await?;
        Ok(client.clone())
    }

    async fn build(
        &self,
        name: &str,
        entry: &Entry,
        config_override: Option<ClientConfig>,
    ) -> ConduitResult<Arc<ApiClient>> {
        let config = config_override.unwrap_or_else(|| entry.config.clone());
        let client = (entry.constructor)(name, config)?;
        client.initialize().await?;

        if let Some(resolver) = &self.credentials {
            match resolver(&client) {
                Some(credentials) => client.authenticate(credentials)?,
                None => warn!(client = %name, "No credentials available; client stays unauthenticated"),
            }
        }

        info!(client = %name, provider = client.provider(), "Client constructed");
        Ok(Arc::new(client))
    }

    fn entry(&self, name: &str) -> ConduitResult<Arc<Entry>> {
        self.entries
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ConduitError::not_registered(name))
    }

    /// Registered names in sorted order
    pub fn registered_names(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Whether `name` has a built instance
    pub fn is_constructed(&self, name: &str) -> bool {
        self.entries
            .read()
            .get(name)
            .is_some_and(|entry| entry.instance.initialized())
    }

    fn constructed(&self) -> Vec<(String, Arc<ApiClient>)> {
        self.entries
            .read()
            .iter()
            .filter_map(|(name, entry)| entry.instance.get().map(|c| (name.clone(), c.clone())))
            .collect()
    }

    /// Local health of every constructed client; idle registrations are listed but not
    /// built
    pub fn get_health_status(&self) -> RegistryHealth {
        let entries = self.entries.read();
        let mut clients = BTreeMap::new();
        let mut idle = Vec::new();

        for (name, entry) in entries.iter() {
            match entry.instance.get() {
                Some(client) => {
                    clients.insert(name.clone(), client.get_health());
                }
                None => idle.push(name.clone()),
            }
        }

        RegistryHealth {
            healthy: clients.values().all(|health| health.healthy),
            clients,
            idle,
        }
    }

    /// Probe every constructed client concurrently. One client's failure is reported in
    /// its outcome and never aborts the others.
    pub async fn test_all_connections(&self) -> Vec<ConnectionOutcome> {
        let probes = self.constructed().into_iter().map(|(name, client)| async move {
            let result = client.test_connection().await;
            if let Err(e) = &result {
                warn!(client = %name, error = %e, "Connection test failed");
            }
            ConnectionOutcome::from_result(name, result)
        });
        join_all(probes).await
    }

    /// Destroy every constructed client and forget the instances. Recipes stay
    /// registered, so the next lookup builds a new client.
    pub async fn destroy_all(&self) {
        let clients = {
            let mut entries = self.entries.write();
            let mut clients = Vec::new();
            for entry in entries.values_mut() {
                if let Some(client) = entry.instance.get() {
                    clients.push(client.clone());
                    *entry = Arc::new(entry.fresh());
                }
            }
            clients
        };

        let count = clients.len();
        join_all(clients.iter().map(|client| client.destroy())).await;
        if count > 0 {
            info!(count, "Destroyed registry clients");
        }
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("clients", &self.registered_names())
            .field("has_credential_resolver", &self.credentials.is_some())
            .finish()
    }
}
