//! Authoritative store contract.
//!
//! Filter-based `find_one`/`find` plus `update_one` with `$set`, array-push,
//! and positional array-element semantics. Updates are atomic per matched
//! document; per-record serialization happens at the store layer, not above
//! it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use vouch_core::{Filter, VouchResult};

/// A single update document applied by `update_one`.
#[derive(Debug, Clone)]
pub enum UpdateDoc {
    /// Set top-level fields on the matched document.
    Set(BTreeMap<String, Value>),
    /// Append a value to an array field on the matched document.
    Push { field: String, value: Value },
    /// Set fields on the first element of `array` that satisfies the
    /// filter's dotted conditions on that array (positional update). Keys in
    /// `set` are relative to the array element.
    SetMatched {
        array: String,
        set: BTreeMap<String, Value>,
    },
}

impl UpdateDoc {
    /// Convenience constructor for a single-field `Set`.
    pub fn set_field(field: impl Into<String>, value: Value) -> Self {
        let mut map = BTreeMap::new();
        map.insert(field.into(), value);
        Self::Set(map)
    }
}

/// The authoritative document store. Owns every record; the cache layer only
/// ever holds projection copies of what this store returns.
#[async_trait]
pub trait AuthoritativeStore: Send + Sync {
    /// Insert a document into a collection.
    async fn insert_one(&self, collection: &str, document: Value) -> VouchResult<()>;

    /// Find the first document matching the filter.
    async fn find_one(&self, collection: &str, filter: &Filter) -> VouchResult<Option<Value>>;

    /// Find all documents matching the filter.
    async fn find(&self, collection: &str, filter: &Filter) -> VouchResult<Vec<Value>>;

    /// Apply an update to the first document matching the filter. Returns
    /// the number of matched documents (0 or 1). The update is atomic with
    /// respect to concurrent operations on the same document.
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateDoc,
    ) -> VouchResult<u64>;
}
