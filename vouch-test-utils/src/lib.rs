//! Vouch Test Utilities
//!
//! Centralized test infrastructure for the vouch workspace:
//! - Deterministic mock key provider with failure injection
//! - Counting store wrapper for asserting exact query counts
//! - In-memory object store
//! - Fixtures for common request shapes

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use vouch_core::{CryptoError, Filter, RawAddress, StorageError, VouchResult};
use vouch_crypto::{DataKey, KeyProvider, PlainKey, KEY_LEN};
use vouch_storage::{AuthoritativeStore, InMemoryStore, ObjectStore, UpdateDoc};

// Re-export the pieces nearly every test needs.
pub use vouch_crypto::LocalKeyProvider;
pub use vouch_storage::{ConsistencyGate, InMemoryCacheBackend};

// ============================================================================
// MOCK KEY PROVIDER
// ============================================================================

/// Pad used to derive a mock "wrapped" key from its plaintext. Keeps the two
/// byte strings distinct without real cryptography.
const MOCK_WRAP_PAD: u8 = 0x5A;

/// Deterministic key provider with failure injection and call counters.
///
/// The n-th generated key has every byte equal to n, and the mock wrapping is
/// a fixed XOR pad, so tests can predict both halves. Not a cipher; only for
/// asserting pipeline behavior around the provider seam.
pub struct MockKeyProvider {
    counter: AtomicU64,
    generate_calls: AtomicU64,
    decrypt_calls: AtomicU64,
    fail_generate: AtomicBool,
    fail_decrypt: AtomicBool,
}

impl MockKeyProvider {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
            generate_calls: AtomicU64::new(0),
            decrypt_calls: AtomicU64::new(0),
            fail_generate: AtomicBool::new(false),
            fail_decrypt: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `generate_data_key` fail.
    pub fn fail_generate(&self, fail: bool) {
        self.fail_generate.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `decrypt_data_key` fail.
    pub fn fail_decrypt(&self, fail: bool) {
        self.fail_decrypt.store(fail, Ordering::SeqCst);
    }

    pub fn generate_calls(&self) -> u64 {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn decrypt_calls(&self) -> u64 {
        self.decrypt_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockKeyProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyProvider for MockKeyProvider {
    async fn generate_data_key(&self) -> VouchResult<DataKey> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_generate.load(Ordering::SeqCst) {
            return Err(CryptoError::KeyProvider {
                operation: "generate_data_key".to_string(),
                reason: "injected failure".to_string(),
            }
            .into());
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let byte = (n % 251 + 1) as u8;
        let key_bytes = [byte; KEY_LEN];
        let ciphertext = key_bytes.iter().map(|b| b ^ MOCK_WRAP_PAD).collect();

        Ok(DataKey {
            plaintext: PlainKey::from_bytes(key_bytes),
            ciphertext,
        })
    }

    async fn decrypt_data_key(&self, ciphertext: &[u8]) -> VouchResult<PlainKey> {
        self.decrypt_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_decrypt.load(Ordering::SeqCst) {
            return Err(CryptoError::KeyProvider {
                operation: "decrypt_data_key".to_string(),
                reason: "injected failure".to_string(),
            }
            .into());
        }

        let unwrapped: Vec<u8> = ciphertext.iter().map(|b| b ^ MOCK_WRAP_PAD).collect();
        PlainKey::from_slice(&unwrapped)
    }
}

// ============================================================================
// COUNTING STORE
// ============================================================================

/// Wraps an `InMemoryStore` and counts every call, so tests can assert exact
/// query counts (single-flight de-duplication, zero-write error paths).
pub struct CountingStore {
    inner: InMemoryStore,
    inserts: AtomicU64,
    finds: AtomicU64,
    updates: AtomicU64,
    fail_writes: AtomicBool,
}

impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryStore::new(),
            inserts: AtomicU64::new(0),
            finds: AtomicU64::new(0),
            updates: AtomicU64::new(0),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent insert/update fail without touching the data.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn insert_count(&self) -> u64 {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn find_count(&self) -> u64 {
        self.finds.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> u64 {
        self.updates.load(Ordering::SeqCst)
    }
}

impl Default for CountingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthoritativeStore for CountingStore {
    async fn insert_one(&self, collection: &str, document: Value) -> VouchResult<()> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::InsertFailed {
                collection: collection.to_string(),
                reason: "injected failure".to_string(),
            }
            .into());
        }
        self.inner.insert_one(collection, document).await
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> VouchResult<Option<Value>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find_one(collection, filter).await
    }

    async fn find(&self, collection: &str, filter: &Filter) -> VouchResult<Vec<Value>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find(collection, filter).await
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateDoc,
    ) -> VouchResult<u64> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::UpdateFailed {
                collection: collection.to_string(),
                reason: "injected failure".to_string(),
            }
            .into());
        }
        self.inner.update_one(collection, filter, update).await
    }
}

// ============================================================================
// MEMORY OBJECT STORE
// ============================================================================

/// In-memory object store. URLs use a fixed fake host so that
/// `object_key_from_url` round-trips.
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    uploads: AtomicU64,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            uploads: AtomicU64::new(0),
        }
    }

    pub fn upload_count(&self) -> u64 {
        self.uploads.load(Ordering::SeqCst)
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, data: Vec<u8>, key: &str, _content_type: &str) -> VouchResult<String> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.objects.write().await.insert(key.to_string(), data);
        Ok(format!("https://objects.test/{key}"))
    }

    async fn download(&self, key: &str) -> VouchResult<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| {
                StorageError::ObjectStore {
                    operation: "download".to_string(),
                    reason: format!("no object under key {key}"),
                }
                .into()
            })
    }

    async fn delete(&self, key: &str) -> VouchResult<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// A plausible raw address for assembly tests.
pub fn sample_address() -> RawAddress {
    RawAddress {
        line1: "1 Analytical Way".to_string(),
        line2: None,
        city: "London".to_string(),
        region: "Greater London".to_string(),
        postal_code: "EC1A 1AA".to_string(),
        country: "GB".to_string(),
    }
}

/// A small but valid PDF header, enough to exercise upload paths.
pub fn sample_pdf_bytes() -> Vec<u8> {
    b"%PDF-1.4\n%fixture\n".to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_roundtrip() {
        let provider = MockKeyProvider::new();
        let key = provider.generate_data_key().await.unwrap();
        let unwrapped = provider.decrypt_data_key(&key.ciphertext).await.unwrap();
        assert_eq!(unwrapped.as_bytes(), key.plaintext.as_bytes());
        assert_eq!(provider.generate_calls(), 1);
        assert_eq!(provider.decrypt_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_provider_keys_differ() {
        let provider = MockKeyProvider::new();
        let a = provider.generate_data_key().await.unwrap();
        let b = provider.generate_data_key().await.unwrap();
        assert_ne!(a.plaintext.as_bytes(), b.plaintext.as_bytes());
    }

    #[tokio::test]
    async fn test_mock_provider_failure_injection() {
        let provider = MockKeyProvider::new();
        provider.fail_generate(true);
        assert!(provider.generate_data_key().await.is_err());

        provider.fail_generate(false);
        assert!(provider.generate_data_key().await.is_ok());
    }

    #[tokio::test]
    async fn test_counting_store_counts_and_fail_writes() {
        let store = CountingStore::new();
        store
            .insert_one("applicants", serde_json::json!({"applicant_id": "a1"}))
            .await
            .unwrap();
        assert_eq!(store.insert_count(), 1);

        store.fail_writes(true);
        let err = store
            .insert_one("applicants", serde_json::json!({"applicant_id": "a2"}))
            .await
            .unwrap_err();
        assert!(!err.is_not_found());

        // The failed insert never landed.
        store.fail_writes(false);
        let all = store.find("applicants", &Filter::new()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_memory_object_store_roundtrip() {
        let store = MemoryObjectStore::new();
        let url = store
            .upload(sample_pdf_bytes(), "docs/x.pdf", "application/pdf")
            .await
            .unwrap();
        let key = vouch_storage::object_key_from_url(&url).unwrap();
        assert_eq!(key, "docs/x.pdf");
        assert_eq!(store.download(&key).await.unwrap(), sample_pdf_bytes());
    }
}
