//! Canonical query filters.
//!
//! A `Filter` is a flat field -> value mapping backed by a `BTreeMap`, so
//! the set of entries alone determines its canonical form. Insertion order
//! never affects equality or the derived cache key. Dotted field names
//! (`documents.document_id`) address elements of embedded arrays, matching
//! the authoritative store's filter semantics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CacheError;

/// A single filter value. Closed over the scalar types the store understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Uuid> for FilterValue {
    fn from(v: Uuid) -> Self {
        Self::String(v.to_string())
    }
}

impl From<&FilterValue> for serde_json::Value {
    fn from(v: &FilterValue) -> Self {
        match v {
            FilterValue::Null => serde_json::Value::Null,
            FilterValue::Bool(b) => serde_json::Value::Bool(*b),
            FilterValue::Int(n) => serde_json::Value::from(*n),
            FilterValue::Float(f) => {
                serde_json::Number::from_f64(*f).map_or(serde_json::Value::Null, serde_json::Value::Number)
            }
            FilterValue::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// An equality filter over record fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Filter(BTreeMap<String, FilterValue>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition. Re-adding a field overwrites it.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &FilterValue)> {
        self.0.iter()
    }

    pub fn get(&self, field: &str) -> Option<&FilterValue> {
        self.0.get(field)
    }

    /// Render the canonical serialization: a JSON object with keys in sorted
    /// order. Equal filters always produce the identical string regardless of
    /// how they were built. Non-finite floats cannot be canonically
    /// serialized and yield a `KeyDerivation` error, which the read path
    /// treats as a cache-bypass signal.
    pub fn canonical_json(&self) -> Result<String, CacheError> {
        let mut out = String::from("{");
        for (i, (field, value)) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            let quoted = serde_json::to_string(field).map_err(|e| CacheError::KeyDerivation {
                reason: e.to_string(),
            })?;
            out.push_str(&quoted);
            out.push(':');
            match value {
                FilterValue::Null => out.push_str("null"),
                FilterValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
                FilterValue::Int(n) => out.push_str(&n.to_string()),
                FilterValue::Float(f) => {
                    if !f.is_finite() {
                        return Err(CacheError::KeyDerivation {
                            reason: format!("non-finite float for field {field}"),
                        });
                    }
                    out.push_str(&f.to_string());
                }
                FilterValue::String(s) => {
                    let quoted =
                        serde_json::to_string(s).map_err(|e| CacheError::KeyDerivation {
                            reason: e.to_string(),
                        })?;
                    out.push_str(&quoted);
                }
            }
        }
        out.push('}');
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_does_not_affect_canonical_form() {
        let a = Filter::new()
            .eq("client_id", "c1")
            .eq("deleted", false)
            .eq("applicant_id", "a1");
        let b = Filter::new()
            .eq("deleted", false)
            .eq("applicant_id", "a1")
            .eq("client_id", "c1");

        assert_eq!(a, b);
        assert_eq!(a.canonical_json().unwrap(), b.canonical_json().unwrap());
    }

    #[test]
    fn test_canonical_form_is_sorted() {
        let filter = Filter::new().eq("b", 2i64).eq("a", 1i64);
        assert_eq!(filter.canonical_json().unwrap(), r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn test_different_filters_differ() {
        let a = Filter::new().eq("client_id", "c1");
        let b = Filter::new().eq("client_id", "c2");
        assert_ne!(a.canonical_json().unwrap(), b.canonical_json().unwrap());
    }

    #[test]
    fn test_non_finite_float_fails_canonicalization() {
        let filter = Filter::new().eq("score", f64::NAN);
        let err = filter.canonical_json().unwrap_err();
        assert!(matches!(err, CacheError::KeyDerivation { .. }));

        let filter = Filter::new().eq("score", f64::INFINITY);
        assert!(filter.canonical_json().is_err());
    }

    #[test]
    fn test_string_values_are_escaped() {
        let filter = Filter::new().eq("name", "a\"b");
        assert_eq!(filter.canonical_json().unwrap(), r#"{"name":"a\"b"}"#);
    }

    #[test]
    fn test_overwriting_a_field_keeps_last_value() {
        let filter = Filter::new().eq("deleted", true).eq("deleted", false);
        assert_eq!(filter.canonical_json().unwrap(), r#"{"deleted":false}"#);
    }
}
