//! Named client registry
//!
//! The registry holds recipes (constructor plus config) under a name and builds each
//! client the first time it is asked for. It is an ordinary value owned by the
//! application's composition root; nothing here is global.

mod client_registry;
#[cfg(test)]
mod tests;
mod types;

pub use client_registry::ClientRegistry;
pub use types::{ClientConstructor, ConnectionOutcome, CredentialResolver, RegistryHealth};
