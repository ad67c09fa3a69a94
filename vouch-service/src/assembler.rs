//! Record assembly.
//!
//! Turns untrusted input plus a freshly generated data key into a
//! persistable record: validation first (the first missing or invalid field
//! wins), then id generation, per-field encryption, and timestamp/status
//! stamping. The assembler never persists anything and never sees the
//! store.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use uuid::Uuid;

use vouch_core::{
    new_record_id, Applicant, ApplicantStatus, ClientId, Document, DocumentStatus, DocumentType,
    EncryptedData, RawAddress, ValidationError, VouchResult,
};
use vouch_crypto::{encrypt_address, encrypt_field, DataKey};

use crate::types::CreateApplicantRequest;

/// Default verification level when the request leaves it unset.
const DEFAULT_VERIFICATION_LEVEL: &str = "basic";

pub struct RecordAssembler;

impl RecordAssembler {
    /// Validate an applicant creation request without side effects.
    ///
    /// Runs before the key provider is ever contacted, so an invalid request
    /// costs no KMS call and no store write.
    pub fn validate_applicant(req: &CreateApplicantRequest) -> Result<(), ValidationError> {
        require("first_name", &req.first_name)?;
        require("last_name", &req.last_name)?;
        require("email", &req.email)?;
        if !req.email.contains('@') {
            return Err(ValidationError::InvalidValue {
                field: "email".to_string(),
                reason: "not an email address".to_string(),
            });
        }
        require("phone", &req.phone)?;
        require("dob", &req.dob)?;
        validate_address(&req.address)?;
        Ok(())
    }

    /// Build a persistable applicant. The caller supplies the data key; its
    /// plaintext half is used for field encryption and dropped with the
    /// `DataKey` once this returns.
    pub fn assemble_applicant(
        client_id: &ClientId,
        req: &CreateApplicantRequest,
        data_key: &DataKey,
    ) -> VouchResult<Applicant> {
        Self::validate_applicant(req)?;

        let now = Utc::now();
        let encrypted = EncryptedData {
            dob: encrypt_field(&req.dob, &data_key.plaintext)?,
            address: encrypt_address(&req.address, &data_key.plaintext)?,
            encrypted_key: BASE64.encode(&data_key.ciphertext),
        };

        Ok(Applicant {
            applicant_id: new_record_id(),
            client_id: client_id.as_str().to_string(),
            first_name: req.first_name.clone(),
            middle_name: req.middle_name.clone(),
            last_name: req.last_name.clone(),
            email: req.email.clone(),
            phone: req.phone.clone(),
            verification_level: req
                .verification_level
                .clone()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_VERIFICATION_LEVEL.to_string()),
            encrypted,
            status: ApplicantStatus::initial(),
            documents: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted: false,
            deleted_at: None,
            deleted_by: None,
        })
    }

    /// Build a persistable document record for an already-uploaded payload.
    pub fn assemble_document(
        applicant_id: Uuid,
        document_type: DocumentType,
        country: &str,
        file_url: &str,
        file_size: u64,
    ) -> Result<Document, ValidationError> {
        require("country", country)?;
        let now = Utc::now();
        Ok(Document {
            document_id: new_record_id(),
            applicant_id,
            document_type,
            country: country.to_string(),
            file_url: file_url.to_string(),
            file_size,
            status: DocumentStatus::initial(),
            created_at: now,
            updated_at: now,
            deleted: false,
            deleted_at: None,
            deleted_by: None,
        })
    }
}

fn require(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn validate_address(address: &RawAddress) -> Result<(), ValidationError> {
    require("address.line1", &address.line1)?;
    require("address.city", &address.city)?;
    require("address.region", &address.region)?;
    require("address.postal_code", &address.postal_code)?;
    require("address.country", &address.country)?;
    Ok(())
}
