//! In-memory implementation of the authoritative store.
//!
//! Backs tests and development environments. Uses a single async RwLock over
//! all collections, which gives the per-document atomicity the trait
//! promises without finer-grained locking.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use vouch_core::{Filter, FilterValue, StorageError, VouchResult};

use crate::store::{AuthoritativeStore, UpdateDoc};

/// In-memory document store keyed by collection name.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Does `doc` satisfy a single dotted-path equality condition?
///
/// A path segment that lands on an array matches when any element satisfies
/// the remainder of the path, mirroring the store's embedded-array filter
/// semantics.
fn path_matches(doc: &Value, path: &str, expected: &Value) -> bool {
    match path.split_once('.') {
        None => match doc.get(path) {
            Some(actual) => actual == expected,
            None => expected.is_null(),
        },
        Some((head, rest)) => match doc.get(head) {
            Some(Value::Array(items)) => items.iter().any(|item| path_matches(item, rest, expected)),
            Some(inner) => path_matches(inner, rest, expected),
            None => false,
        },
    }
}

fn doc_matches(doc: &Value, filter: &Filter) -> bool {
    filter
        .entries()
        .all(|(field, value)| path_matches(doc, field, &Value::from(value)))
}

/// Index of the first element of `array_field` satisfying every filter
/// condition dotted under that field. This is what a positional update
/// resolves against.
fn matched_element_index(doc: &Value, filter: &Filter, array_field: &str) -> Option<usize> {
    let prefix = format!("{array_field}.");
    let conditions: Vec<(&str, &FilterValue)> = filter
        .entries()
        .filter_map(|(field, value)| {
            field
                .strip_prefix(prefix.as_str())
                .map(|relative| (relative, value))
        })
        .collect();

    let items = doc.get(array_field)?.as_array()?;
    items.iter().position(|item| {
        conditions
            .iter()
            .all(|(relative, value)| path_matches(item, relative, &Value::from(*value)))
    })
}

fn apply_update(doc: &mut Value, filter: &Filter, update: &UpdateDoc) -> Result<(), String> {
    match update {
        UpdateDoc::Set(fields) => {
            let object = doc.as_object_mut().ok_or("document is not an object")?;
            for (field, value) in fields {
                object.insert(field.clone(), value.clone());
            }
            Ok(())
        }
        UpdateDoc::Push { field, value } => {
            let object = doc.as_object_mut().ok_or("document is not an object")?;
            let entry = object
                .entry(field.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            entry
                .as_array_mut()
                .ok_or("push target is not an array")?
                .push(value.clone());
            Ok(())
        }
        UpdateDoc::SetMatched { array, set } => {
            let index = matched_element_index(doc, filter, array)
                .ok_or("no array element matched the positional filter")?;
            let element = doc
                .get_mut(array)
                .and_then(|a| a.get_mut(index))
                .ok_or("matched element disappeared")?;
            let object = element.as_object_mut().ok_or("array element is not an object")?;
            for (field, value) in set {
                object.insert(field.clone(), value.clone());
            }
            Ok(())
        }
    }
}

#[async_trait]
impl AuthoritativeStore for InMemoryStore {
    async fn insert_one(&self, collection: &str, document: Value) -> VouchResult<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> VouchResult<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc_matches(doc, filter)).cloned()))
    }

    async fn find(&self, collection: &str, filter: &Filter) -> VouchResult<Vec<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| doc_matches(doc, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateDoc,
    ) -> VouchResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let Some(doc) = docs.iter_mut().find(|doc| doc_matches(doc, filter)) else {
            return Ok(0);
        };
        // A positional update matches only when one element satisfies every
        // dotted condition at once; otherwise it is a miss, not a failure.
        if let UpdateDoc::SetMatched { array, .. } = update {
            if matched_element_index(doc, filter, array).is_none() {
                return Ok(0);
            }
        }
        apply_update(doc, filter, update).map_err(|reason| StorageError::UpdateFailed {
            collection: collection.to_string(),
            reason: reason.to_string(),
        })?;
        Ok(1)
    }
}
