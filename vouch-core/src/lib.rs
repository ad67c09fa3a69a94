//! Vouch Core - Data Types
//!
//! Pure data structures with no behavior beyond construction and parsing.
//! All other crates depend on this. This crate contains ONLY data types,
//! enums, filters, and the error taxonomy - no I/O and no async.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub mod entities;
pub mod enums;
pub mod error;
pub mod filter;

pub use entities::{
    Applicant, ClientCredential, Document, EncryptedAddress, EncryptedData, EncryptedField,
    RawAddress,
};
pub use enums::{ApplicantStatus, DocumentStatus, DocumentType};
pub use error::{
    AuthError, CacheError, ConfigError, CryptoError, StorageError, ValidationError, VouchError,
    VouchResult,
};
pub use filter::{Filter, FilterValue};

/// Record identifier. UUIDv7 embeds a Unix timestamp, making IDs naturally
/// sortable by creation time.
pub type RecordId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Opaque client organization identifier, resolved by the auth layer before
/// the core pipeline runs. The core trusts it as already authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generate a new UUIDv7 record id (timestamp-sortable).
pub fn new_record_id() -> RecordId {
    Uuid::now_v7()
}

/// Compute SHA-256 hash of content.
pub fn sha256_bytes(content: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}
