//! Deterministic cache key derivation.
//!
//! A cache key is a pure function of (collection, canonical filter): equal
//! canonical filters always produce the identical key, and unequal filters
//! collide only with SHA-256 collision probability. The collection name is
//! kept as a readable prefix for operability; the hash alone carries the
//! collision resistance.

use sha2::{Digest, Sha256};

use vouch_core::{CacheError, Filter};

/// Separator between the hashed components, so ("ab", filter) and
/// ("a", b-prefixed filter) cannot produce the same digest input.
const SEPARATOR: u8 = 0xFF;

/// A derived cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the cache key for a (collection, filter) pair.
///
/// Fails with `CacheError::KeyDerivation` when the filter has no canonical
/// serialization; callers treat that as a cache-bypass signal and fall
/// through to the authoritative store.
pub fn derive_cache_key(collection: &str, filter: &Filter) -> Result<CacheKey, CacheError> {
    let canonical = filter.canonical_json()?;

    let mut hasher = Sha256::new();
    hasher.update(collection.as_bytes());
    hasher.update([SEPARATOR]);
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();

    Ok(CacheKey(format!("{collection}:{}", hex::encode(digest))))
}
