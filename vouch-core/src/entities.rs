//! Persisted record shapes.
//!
//! Records are owned exclusively by the authoritative store; the cache only
//! ever holds read-only projection copies. Records are never hard-deleted:
//! deletion is a status flag, preserving auditability.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{ApplicantStatus, DocumentStatus, DocumentType};

/// A single encrypted field value.
///
/// `data` is base64(nonce || ciphertext+tag) produced by the field cipher;
/// `version` tags the wire format so the algorithm can be rotated later.
/// Immutable once written. The serialized form never contains plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedField {
    pub version: u8,
    pub data: String,
}

/// Encrypted address: each component is encrypted independently so that a
/// single field can be decrypted and audited without exposing the others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedAddress {
    pub line1: EncryptedField,
    pub line2: Option<EncryptedField>,
    pub city: EncryptedField,
    pub region: EncryptedField,
    pub postal_code: EncryptedField,
    pub country: EncryptedField,
}

/// The envelope-encrypted portion of an applicant record.
///
/// `encrypted_key` is the base64 of the record's data key as wrapped by the
/// key provider. The plaintext data key is never persisted; decrypting any
/// field requires unwrapping this ciphertext through the provider first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedData {
    pub dob: EncryptedField,
    pub address: EncryptedAddress,
    pub encrypted_key: String,
}

/// Plaintext address as submitted by the client, before encryption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAddress {
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
}

/// An applicant record as persisted in the authoritative store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applicant {
    pub applicant_id: Uuid,
    pub client_id: String,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub verification_level: String,
    pub encrypted: EncryptedData,
    pub status: ApplicantStatus,
    #[serde(default)]
    pub documents: Vec<Document>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted_by: Option<String>,
}

/// A supporting document record, embedded in its owning applicant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub document_id: Uuid,
    pub applicant_id: Uuid,
    pub document_type: DocumentType,
    pub country: String,
    pub file_url: String,
    pub file_size: u64,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted_by: Option<String>,
}

/// A client organization's API credential, stored hashed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientCredential {
    pub client_id: String,
    pub client_secret_hash: String,
    pub revoked: bool,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_field(tag: &str) -> EncryptedField {
        EncryptedField {
            version: 1,
            data: format!("b64-{tag}"),
        }
    }

    fn sample_applicant() -> Applicant {
        let now = Utc::now();
        Applicant {
            applicant_id: Uuid::now_v7(),
            client_id: "client-1".to_string(),
            first_name: "Ada".to_string(),
            middle_name: None,
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "+44 20 7946 0000".to_string(),
            verification_level: "basic".to_string(),
            encrypted: EncryptedData {
                dob: sample_field("dob"),
                address: EncryptedAddress {
                    line1: sample_field("l1"),
                    line2: None,
                    city: sample_field("city"),
                    region: sample_field("region"),
                    postal_code: sample_field("pc"),
                    country: sample_field("country"),
                },
                encrypted_key: "b64-wrapped-key".to_string(),
            },
            status: ApplicantStatus::Pending,
            documents: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted: false,
            deleted_at: None,
            deleted_by: None,
        }
    }

    #[test]
    fn test_applicant_serde_roundtrip() {
        let applicant = sample_applicant();
        let json = serde_json::to_value(&applicant).unwrap();
        let back: Applicant = serde_json::from_value(json).unwrap();
        assert_eq!(applicant, back);
    }

    #[test]
    fn test_serialized_applicant_has_no_plaintext_sensitive_fields() {
        let applicant = sample_applicant();
        let json = serde_json::to_string(&applicant).unwrap();
        // Only the ciphertext representation is present.
        assert!(json.contains("b64-dob"));
        assert!(!json.contains("\"dob\":\"19"));
    }

    #[test]
    fn test_optional_fields_default_when_absent() {
        let json = serde_json::json!({
            "client_id": "c1",
            "client_secret_hash": "abc",
            "revoked": false,
        });
        let cred: ClientCredential = serde_json::from_value(json).unwrap();
        assert!(cred.deleted_at.is_none());
    }
}
