//! Projection fetchers handed to the consistency gate on cache miss.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use vouch_core::{Filter, VouchResult};
use vouch_storage::{AuthoritativeStore, ProjectionFetcher};

/// Fetches the first document matching a filter from one collection.
pub struct FindOneFetcher {
    store: Arc<dyn AuthoritativeStore>,
    collection: String,
    filter: Filter,
}

impl FindOneFetcher {
    pub fn new(store: Arc<dyn AuthoritativeStore>, collection: &str, filter: Filter) -> Self {
        Self {
            store,
            collection: collection.to_string(),
            filter,
        }
    }
}

#[async_trait]
impl ProjectionFetcher for FindOneFetcher {
    async fn fetch(&self) -> VouchResult<Option<Value>> {
        self.store.find_one(&self.collection, &self.filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vouch_storage::InMemoryStore;

    #[tokio::test]
    async fn test_find_one_fetcher() {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_one("applicants", json!({"applicant_id": "a1"}))
            .await
            .unwrap();

        let hit = FindOneFetcher::new(
            store.clone(),
            "applicants",
            Filter::new().eq("applicant_id", "a1"),
        );
        assert!(hit.fetch().await.unwrap().is_some());

        let miss = FindOneFetcher::new(
            store,
            "applicants",
            Filter::new().eq("applicant_id", "zz"),
        );
        assert!(miss.fetch().await.unwrap().is_none());
    }
}
