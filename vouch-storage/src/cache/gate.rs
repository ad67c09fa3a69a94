//! Cache-coherent read/write protocol.
//!
//! Reads are cache-first with single-flight de-duplication: concurrent gets
//! for the same key collapse into one authoritative-store query. Writes are
//! performed by the services against the store first; only after the store
//! acknowledges success do they call `invalidate`, which drops the cached
//! value synchronously. Each in-flight population carries a fence that
//! `invalidate` bumps, so a fill whose store read predates a concurrent
//! write is discarded instead of resurrecting the pre-write projection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;

use vouch_core::{Filter, StorageError, VouchResult};

use crate::cache::key::{derive_cache_key, CacheKey};
use crate::cache::traits::CacheBackend;

/// Gate configuration.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// TTL applied to populated entries. Correctness never depends on it;
    /// invalidation after writes does the real work.
    pub entry_ttl: Option<Duration>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            entry_ttl: Some(Duration::from_secs(3600)),
        }
    }
}

/// Fetches the authoritative projection for one (collection, filter) pair
/// on cache miss. Implemented per read operation by the service layer.
#[async_trait]
pub trait ProjectionFetcher: Send + Sync {
    async fn fetch(&self) -> VouchResult<Option<Value>>;
}

/// One in-flight population. The fence counts invalidations that landed
/// while the population was running; a fill is only kept if the fence did
/// not move between the store read and the cache write.
#[derive(Default)]
struct Flight {
    lock: Mutex<()>,
    fence: AtomicU64,
}

/// The consistency gate. The only component that reads or writes the cache
/// backend.
pub struct ConsistencyGate {
    cache: Arc<dyn CacheBackend>,
    /// Per-key population state. A key is only present here while some task
    /// is populating it; a failed or cancelled population releases the lock
    /// and leaves the key absent.
    flights: DashMap<CacheKey, Arc<Flight>>,
    config: GateConfig,
}

impl ConsistencyGate {
    pub fn new(cache: Arc<dyn CacheBackend>, config: GateConfig) -> Self {
        Self {
            cache,
            flights: DashMap::new(),
            config,
        }
    }

    pub fn with_defaults(cache: Arc<dyn CacheBackend>) -> Self {
        Self::new(cache, GateConfig::default())
    }

    /// Cache-first read.
    ///
    /// Key derivation failure is a cache-bypass signal: the fetcher is
    /// invoked directly and nothing is cached. Concurrent gets for the same
    /// key while a population is in flight wait for it rather than issuing
    /// duplicate store queries.
    pub async fn get<T, F>(
        &self,
        collection: &str,
        filter: &Filter,
        fetcher: &F,
    ) -> VouchResult<Option<T>>
    where
        T: DeserializeOwned,
        F: ProjectionFetcher + ?Sized,
    {
        let key = match derive_cache_key(collection, filter) {
            Ok(key) => key,
            Err(err) => {
                tracing::warn!(collection, error = %err, "cache key underivable, bypassing cache");
                return match fetcher.fetch().await? {
                    Some(value) => Ok(Some(decode(collection, value)?)),
                    None => Ok(None),
                };
            }
        };

        if let Some(value) = self.cache.get(&key).await? {
            return Ok(Some(decode(collection, value)?));
        }

        // Single-flight: first caller populates, the rest wait and then hit
        // the cache on re-check.
        let flight = {
            let entry = self.flights.entry(key.clone()).or_default();
            Arc::clone(entry.value())
        };
        let _populating = flight.lock.lock().await;

        if let Some(value) = self.cache.get(&key).await? {
            self.remove_flight(&key, &flight);
            return Ok(Some(decode(collection, value)?));
        }

        let fence = flight.fence.load(Ordering::Acquire);
        let fetched = fetcher.fetch().await;

        let result = match fetched {
            Err(err) => Err(err),
            Ok(None) => Ok(None),
            Ok(Some(value)) => {
                let mut populated = self
                    .cache
                    .set(&key, value.clone(), self.config.entry_ttl)
                    .await;
                if populated.is_ok() && flight.fence.load(Ordering::Acquire) != fence {
                    // An invalidation landed while the store read was in
                    // flight; the fill may predate that write, so it cannot
                    // stay cached.
                    populated = self.cache.delete(&key).await;
                }
                populated.and_then(|()| decode(collection, value).map(Some))
            }
        };
        self.remove_flight(&key, &flight);
        result
    }

    /// Retire a flight entry, but only the one this task created or joined;
    /// a successor population that already replaced it stays registered.
    fn remove_flight(&self, key: &CacheKey, flight: &Arc<Flight>) {
        self.flights.remove_if(key, |_, v| Arc::ptr_eq(v, flight));
    }

    /// Drop the cached entry for a (collection, filter) pair.
    ///
    /// Callers invoke this only after the authoritative store has
    /// acknowledged the corresponding write; on store failure the cache is
    /// left untouched, since it still reflects the pre-write state. A
    /// population in flight for the same key has its fence bumped first, so
    /// a fill racing this call is discarded rather than outliving it.
    pub async fn invalidate(&self, collection: &str, filter: &Filter) -> VouchResult<()> {
        let key = match derive_cache_key(collection, filter) {
            Ok(key) => key,
            Err(err) => {
                // Nothing can be cached under an underivable key.
                tracing::warn!(collection, error = %err, "cache key underivable on invalidate");
                return Ok(());
            }
        };
        if let Some(flight) = self.flights.get(&key) {
            flight.fence.fetch_add(1, Ordering::AcqRel);
        }
        self.cache.delete(&key).await
    }
}

fn decode<T: DeserializeOwned>(collection: &str, value: Value) -> VouchResult<T> {
    serde_json::from_value(value).map_err(|e| {
        StorageError::MalformedRecord {
            collection: collection.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}
