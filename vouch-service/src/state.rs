//! Application state.
//!
//! Explicit dependency injection: every seam the services need is an `Arc`
//! behind its trait, constructed once at startup and cloned per task.

use std::sync::Arc;

use vouch_core::VouchResult;
use vouch_crypto::{KeyProvider, LocalKeyProvider, PlainKey};
use vouch_storage::{
    AuthoritativeStore, CacheBackend, ConsistencyGate, GateConfig, ObjectStore,
};

use crate::config::ServiceConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: ServiceConfig,
    pub key_provider: Arc<dyn KeyProvider>,
    pub store: Arc<dyn AuthoritativeStore>,
    pub gate: Arc<ConsistencyGate>,
    pub objects: Arc<dyn ObjectStore>,
}

impl AppState {
    pub fn new(
        config: ServiceConfig,
        key_provider: Arc<dyn KeyProvider>,
        store: Arc<dyn AuthoritativeStore>,
        gate: Arc<ConsistencyGate>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            config,
            key_provider,
            store,
            gate,
            objects,
        }
    }

    /// Build state with a local key provider and a gate configured from the
    /// service config. The store, cache backend, and object store are still
    /// injected; this only wires the crypto and cache plumbing.
    pub fn with_local_provider(
        config: ServiceConfig,
        store: Arc<dyn AuthoritativeStore>,
        cache: Arc<dyn CacheBackend>,
        objects: Arc<dyn ObjectStore>,
    ) -> VouchResult<Self> {
        let provider = match config.master_key_bytes()? {
            Some(bytes) => LocalKeyProvider::new(PlainKey::from_bytes(bytes)),
            None => {
                tracing::warn!("no master key configured, using ephemeral key");
                LocalKeyProvider::ephemeral()
            }
        };
        let gate = ConsistencyGate::new(
            cache,
            GateConfig {
                entry_ttl: Some(config.cache_ttl()),
            },
        );
        Ok(Self::new(
            config,
            Arc::new(provider),
            store,
            Arc::new(gate),
            objects,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vouch_storage::{InMemoryCacheBackend, InMemoryStore};
    use vouch_test_utils::MemoryObjectStore;

    #[tokio::test]
    async fn test_with_local_provider_wires_a_working_provider() {
        let config = ServiceConfig {
            master_key_hex: Some("cd".repeat(32)),
            ..ServiceConfig::default()
        };
        let state = AppState::with_local_provider(
            config,
            Arc::new(InMemoryStore::new()),
            Arc::new(InMemoryCacheBackend::new()),
            Arc::new(MemoryObjectStore::new()),
        )
        .unwrap();

        let key = state.key_provider.generate_data_key().await.unwrap();
        let unwrapped = state.key_provider.decrypt_data_key(&key.ciphertext).await.unwrap();
        assert_eq!(unwrapped.as_bytes(), key.plaintext.as_bytes());
    }

    #[test]
    fn test_bad_master_key_is_rejected() {
        let config = ServiceConfig {
            master_key_hex: Some("abcd".to_string()),
            ..ServiceConfig::default()
        };
        let result = AppState::with_local_provider(
            config,
            Arc::new(InMemoryStore::new()),
            Arc::new(InMemoryCacheBackend::new()),
            Arc::new(MemoryObjectStore::new()),
        );
        assert!(result.is_err());
    }
}
