//! In-memory cache backend.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use vouch_core::VouchResult;

use crate::cache::key::CacheKey;
use crate::cache::traits::CacheBackend;

struct Entry {
    value: Value,
    inserted_at: Instant,
    ttl: Option<Duration>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.ttl
            .map(|ttl| now.duration_since(self.inserted_at) >= ttl)
            .unwrap_or(false)
    }
}

/// HashMap-backed cache for tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryCacheBackend {
    entries: RwLock<HashMap<CacheKey, Entry>>,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|e| !e.is_expired(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &CacheKey) -> VouchResult<Option<Value>> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &CacheKey, value: Value, ttl: Option<Duration>) -> VouchResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.clone(),
            Entry {
                value,
                inserted_at: Instant::now(),
                ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> VouchResult<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}
