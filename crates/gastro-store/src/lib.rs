#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Gastro Store
//!
//! Backends are selected at runtime through [`StoreConfig`]; callers only see
//! `Arc<dyn Store>`.

pub mod hosted;
pub mod memory;
pub mod traits;

pub use hosted::{HostedClient, HostedConfig, HostedStore};
pub use memory::MemoryStore;
pub use traits::{
    CouponStore, CustomerStore, LoyaltyStore, ReservationQuery, ReservationStore,
    RestaurantStore, ReviewStore, Store,
};

use gastro_core::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which persistence backend to run against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hosted database over its REST API.
    Hosted,
    /// In-process tables; data is lost on exit.
    #[default]
    Memory,
}

/// Backend selection and connection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend kind.
    #[serde(default)]
    pub kind: BackendKind,
    /// Base URL of the hosted project.
    #[serde(default)]
    pub url: String,
    /// Service key for the hosted project.
    #[serde(default)]
    pub api_key: String,
}

/// Builds the backend selected in `config`.
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn Store>> {
    match config.kind {
        BackendKind::Hosted => {
            let client = HostedClient::new(HostedConfig {
                url: config.url.clone(),
                api_key: config.api_key.clone(),
            })?;
            tracing::info!(url = %config.url, "Using hosted store");
            Ok(Arc::new(HostedStore::new(client)))
        }
        BackendKind::Memory => {
            tracing::warn!("Using in-memory store; data will not persist");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gastro_core::Error;

    #[test]
    fn test_create_memory_store() {
        let store = create_store(&StoreConfig::default()).unwrap();
        assert_eq!(store.name(), "memory");
    }

    #[test]
    fn test_create_hosted_requires_url() {
        let config = StoreConfig {
            kind: BackendKind::Hosted,
            ..StoreConfig::default()
        };
        assert!(matches!(create_store(&config), Err(Error::Config { .. })));
    }

    #[test]
    fn test_create_hosted_store() {
        let config = StoreConfig {
            kind: BackendKind::Hosted,
            url: "https://db.example.com".into(),
            api_key: "service-key".into(),
        };
        assert_eq!(create_store(&config).unwrap().name(), "hosted");
    }

    #[test]
    fn test_backend_kind_serde() {
        let kind: BackendKind = serde_json::from_str("\"hosted\"").unwrap();
        assert_eq!(kind, BackendKind::Hosted);
    }
}
