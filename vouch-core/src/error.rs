//! Error types for vouch operations.
//!
//! Error messages from the crypto layer never include plaintext field values
//! or key material; they carry the operation name only.

use thiserror::Error;

/// Persistence layer errors. `NotFound` is distinct from the failure
/// variants so callers can surface a 404-equivalent instead of a
/// 500-equivalent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Record not found in {collection}")]
    NotFound { collection: String },

    #[error("Insert into {collection} failed: {reason}")]
    InsertFailed { collection: String, reason: String },

    #[error("Update in {collection} failed: {reason}")]
    UpdateFailed { collection: String, reason: String },

    #[error("Write conflict in {collection}: record changed since it was read")]
    WriteConflict { collection: String },

    #[error("Query against {collection} failed: {reason}")]
    QueryFailed { collection: String, reason: String },

    #[error("Malformed record in {collection}: {reason}")]
    MalformedRecord { collection: String, reason: String },

    #[error("Object store {operation} failed: {reason}")]
    ObjectStore { operation: String, reason: String },

    #[error("Invalid object URL: {url}")]
    InvalidObjectUrl { url: String },
}

/// Input validation errors. No side effect has occurred when one of these
/// is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Unsupported MIME type: {mime}")]
    UnsupportedMimeType { mime: String },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

/// Envelope encryption errors. `KeyProvider` (KMS unreachable or denied) is
/// distinguished from `Decryption` (ciphertext/key mismatch) so callers can
/// tell "wrong key" apart from "KMS unreachable". Neither variant ever
/// carries plaintext or key material.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Key provider {operation} failed: {reason}")]
    KeyProvider { operation: String, reason: String },

    #[error("Decryption failed: ciphertext or key mismatch")]
    Decryption,

    #[error("Encryption failed")]
    Encryption,

    #[error("Malformed encrypted field")]
    MalformedField,

    #[error("Invalid key length: expected {expected} bytes")]
    InvalidKeyLength { expected: usize },
}

/// Cache layer errors. `KeyDerivation` is a cache-bypass signal, not a
/// fatal error: the read path falls through to the authoritative store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache key derivation failed: {reason}")]
    KeyDerivation { reason: String },

    #[error("Cache backend {operation} failed: {reason}")]
    Backend { operation: String, reason: String },
}

/// Authentication errors for API-key resolution.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("API key is missing")]
    MissingApiKey,

    #[error("Invalid or inactive API key")]
    InvalidApiKey,
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all vouch operations.
#[derive(Debug, Clone, Error)]
pub enum VouchError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for vouch operations.
pub type VouchResult<T> = Result<T, VouchError>;

impl VouchError {
    /// True when the error means "no matching record" rather than a
    /// persistence failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, VouchError::Storage(StorageError::NotFound { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = StorageError::NotFound {
            collection: "applicants".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("not found"));
        assert!(msg.contains("applicants"));
    }

    #[test]
    fn test_crypto_errors_carry_no_material() {
        let err = CryptoError::Decryption;
        assert_eq!(format!("{}", err), "Decryption failed: ciphertext or key mismatch");

        let err = CryptoError::KeyProvider {
            operation: "generate_data_key".to_string(),
            reason: "connection refused".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("generate_data_key"));
    }

    #[test]
    fn test_validation_error_names_field() {
        let err = ValidationError::RequiredFieldMissing {
            field: "first_name".to_string(),
        };
        assert!(format!("{}", err).contains("first_name"));
    }

    #[test]
    fn test_master_error_from_variants() {
        let storage = VouchError::from(StorageError::NotFound {
            collection: "applicants".to_string(),
        });
        assert!(matches!(storage, VouchError::Storage(_)));
        assert!(storage.is_not_found());

        let crypto = VouchError::from(CryptoError::Decryption);
        assert!(matches!(crypto, VouchError::Crypto(_)));
        assert!(!crypto.is_not_found());

        let cache = VouchError::from(CacheError::KeyDerivation {
            reason: "non-finite float".to_string(),
        });
        assert!(matches!(cache, VouchError::Cache(_)));

        let auth = VouchError::from(AuthError::InvalidApiKey);
        assert!(matches!(auth, VouchError::Auth(_)));
    }
}
