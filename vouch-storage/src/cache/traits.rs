//! Cache backend seam.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use vouch_core::VouchResult;

/// A key/value cache backend. Used exclusively by the `ConsistencyGate`;
/// nothing else reads or writes cache entries.
///
/// Implementations must be safe for concurrent access. Entries hold
/// serialized projections, never the authoritative record.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a cached projection, or None on miss (including TTL expiry).
    async fn get(&self, key: &super::key::CacheKey) -> VouchResult<Option<Value>>;

    /// Store a projection under a derived key with an optional TTL.
    async fn set(
        &self,
        key: &super::key::CacheKey,
        value: Value,
        ttl: Option<Duration>,
    ) -> VouchResult<()>;

    /// Drop an entry. Must complete before the enclosing write operation
    /// reports success - no entry may outlive a write that invalidates it.
    async fn delete(&self, key: &super::key::CacheKey) -> VouchResult<()>;
}
