//! Request and response shapes for the service operations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vouch_core::RawAddress;

/// Untrusted applicant creation input.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateApplicantRequest {
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// Date of birth, ISO 8601 date. Encrypted at rest; never logged.
    pub dob: String,
    #[serde(default)]
    pub verification_level: Option<String>,
    pub address: RawAddress,
}

/// Create responses carry only the new id and a fixed status marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApplicantResponse {
    pub applicant_id: Uuid,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocumentResponse {
    pub document_id: Uuid,
    pub status: String,
}

/// Allow-listed applicant update. Absent fields are left untouched; there is
/// no way to overwrite the encrypted payload or ownership fields through
/// this type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateApplicantRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub verification_level: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl UpdateApplicantRequest {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.verification_level.is_none()
            && self.email.is_none()
            && self.phone.is_none()
    }
}

/// Untrusted document upload input. `data` is the raw file payload.
#[derive(Debug, Clone)]
pub struct UploadDocumentRequest {
    pub applicant_id: Uuid,
    pub document_type: String,
    pub country: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Decrypted applicant PII, returned only by the explicit reveal operation.
/// Deliberately not `Serialize`-logged anywhere; construct, hand to the
/// caller, drop.
#[derive(Debug, Clone, Serialize)]
pub struct RevealedApplicant {
    pub applicant_id: Uuid,
    pub dob: String,
    pub address: RawAddress,
}

/// Marker used in every create response.
pub const CREATED_STATUS: &str = "created";
