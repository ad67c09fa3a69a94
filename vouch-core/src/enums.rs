//! Closed status and document-type enumerations.
//!
//! Status values are drawn from closed enumerations with fallible parse
//! functions. A request naming a value outside the enumeration is rejected
//! before any store mutation occurs - there is no silent default.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Lifecycle status of an applicant record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicantStatus {
    Pending,
    InReview,
    Approved,
    Rejected,
}

impl ApplicantStatus {
    /// Parse a status string, failing on unknown input.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "pending" => Ok(Self::Pending),
            "in_review" => Ok(Self::InReview),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(ValidationError::InvalidValue {
                field: "status".to_string(),
                reason: format!("unknown applicant status: {other}"),
            }),
        }
    }

    /// Initial state for newly created applicants.
    pub fn initial() -> Self {
        Self::Pending
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InReview => "in_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Whether a transition from `self` to `to` is allowed.
    /// Approved and Rejected are terminal.
    pub fn can_transition_to(&self, to: Self) -> bool {
        match self {
            Self::Pending => matches!(to, Self::InReview | Self::Approved | Self::Rejected),
            Self::InReview => matches!(to, Self::Approved | Self::Rejected),
            Self::Approved | Self::Rejected => false,
        }
    }
}

impl std::fmt::Display for ApplicantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Uploaded,
    Processing,
    Verified,
    Rejected,
}

impl DocumentStatus {
    /// Parse a status string, failing on unknown input.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "uploaded" => Ok(Self::Uploaded),
            "processing" => Ok(Self::Processing),
            "verified" => Ok(Self::Verified),
            "rejected" => Ok(Self::Rejected),
            other => Err(ValidationError::InvalidValue {
                field: "status".to_string(),
                reason: format!("unknown document status: {other}"),
            }),
        }
    }

    /// Initial state for newly uploaded documents.
    pub fn initial() -> Self {
        Self::Uploaded
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Processing => "processing",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }

    /// Whether a transition from `self` to `to` is allowed.
    /// Verified and Rejected are terminal.
    pub fn can_transition_to(&self, to: Self) -> bool {
        match self {
            Self::Uploaded => matches!(to, Self::Processing | Self::Verified | Self::Rejected),
            Self::Processing => matches!(to, Self::Verified | Self::Rejected),
            Self::Verified | Self::Rejected => false,
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported identity document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Passport,
    DriversLicense,
    NationalId,
    ResidencePermit,
    UtilityBill,
}

impl DocumentType {
    /// Parse a document type string, failing on unknown input.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "passport" => Ok(Self::Passport),
            "drivers_license" => Ok(Self::DriversLicense),
            "national_id" => Ok(Self::NationalId),
            "residence_permit" => Ok(Self::ResidencePermit),
            "utility_bill" => Ok(Self::UtilityBill),
            other => Err(ValidationError::InvalidValue {
                field: "document_type".to_string(),
                reason: format!("unknown document type: {other}"),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passport => "passport",
            Self::DriversLicense => "drivers_license",
            Self::NationalId => "national_id",
            Self::ResidencePermit => "residence_permit",
            Self::UtilityBill => "utility_bill",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applicant_status_parse_roundtrip() {
        for status in [
            ApplicantStatus::Pending,
            ApplicantStatus::InReview,
            ApplicantStatus::Approved,
            ApplicantStatus::Rejected,
        ] {
            assert_eq!(ApplicantStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_applicant_status_parse_rejects_unknown() {
        let err = ApplicantStatus::parse("archived").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { .. }));
    }

    #[test]
    fn test_document_status_parse_roundtrip() {
        for status in [
            DocumentStatus::Uploaded,
            DocumentStatus::Processing,
            DocumentStatus::Verified,
            DocumentStatus::Rejected,
        ] {
            assert_eq!(DocumentStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_document_status_parse_rejects_unknown() {
        assert!(DocumentStatus::parse("pending_review").is_err());
        assert!(DocumentStatus::parse("").is_err());
        assert!(DocumentStatus::parse("Uploaded").is_err());
    }

    #[test]
    fn test_document_status_transitions() {
        assert!(DocumentStatus::Uploaded.can_transition_to(DocumentStatus::Verified));
        assert!(DocumentStatus::Uploaded.can_transition_to(DocumentStatus::Processing));
        assert!(DocumentStatus::Processing.can_transition_to(DocumentStatus::Rejected));
        assert!(!DocumentStatus::Verified.can_transition_to(DocumentStatus::Uploaded));
        assert!(!DocumentStatus::Rejected.can_transition_to(DocumentStatus::Verified));
    }

    #[test]
    fn test_applicant_status_terminal_states() {
        assert!(!ApplicantStatus::Approved.can_transition_to(ApplicantStatus::Pending));
        assert!(!ApplicantStatus::Rejected.can_transition_to(ApplicantStatus::InReview));
        assert!(ApplicantStatus::Pending.can_transition_to(ApplicantStatus::InReview));
    }

    #[test]
    fn test_document_type_parse_rejects_unknown() {
        assert!(DocumentType::parse("selfie").is_err());
        assert_eq!(
            DocumentType::parse("passport").unwrap(),
            DocumentType::Passport
        );
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&DocumentStatus::Uploaded).unwrap();
        assert_eq!(json, "\"uploaded\"");
        let json = serde_json::to_string(&ApplicantStatus::InReview).unwrap();
        assert_eq!(json, "\"in_review\"");
    }
}
