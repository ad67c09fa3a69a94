//! Service error surface.
//!
//! Maps the internal `VouchError` taxonomy onto a small set of caller-facing
//! error codes with HTTP-equivalent status categories. Internal failure
//! detail (store, crypto, cache) is logged here and replaced with a generic
//! message; validation and not-found errors pass their messages through.

use std::fmt;

use serde::{Deserialize, Serialize};

use vouch_core::{AuthError, StorageError, ValidationError, VouchError};

/// Caller-facing error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Missing or invalid API key.
    Unauthorized,

    /// Request validation failed.
    ValidationFailed,

    /// A required field is missing.
    MissingField,

    /// The requested record does not exist (or is soft-deleted, or belongs
    /// to another client; the three are indistinguishable to the caller).
    NotFound,

    /// The record changed between read and write; the caller should re-read
    /// and retry.
    Conflict,

    /// Anything that is not the caller's fault.
    InternalError,
}

impl ErrorCode {
    /// HTTP-equivalent status for this category.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::Unauthorized => 401,
            ErrorCode::ValidationFailed | ErrorCode::MissingField => 400,
            ErrorCode::NotFound => 404,
            ErrorCode::Conflict => 409,
            ErrorCode::InternalError => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Structured error returned by every service operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceError {
    pub code: ErrorCode,
    pub message: String,
}

impl ServiceError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ServiceError {}

impl From<VouchError> for ServiceError {
    fn from(err: VouchError) -> Self {
        match &err {
            VouchError::Validation(v) => {
                let code = match v {
                    ValidationError::RequiredFieldMissing { .. } => ErrorCode::MissingField,
                    _ => ErrorCode::ValidationFailed,
                };
                ServiceError::new(code, v.to_string())
            }
            VouchError::Auth(a) => {
                let message = match a {
                    AuthError::MissingApiKey => "API key is missing",
                    AuthError::InvalidApiKey => "Invalid or inactive API key",
                };
                ServiceError::new(ErrorCode::Unauthorized, message)
            }
            VouchError::Storage(s) if err.is_not_found() => {
                ServiceError::new(ErrorCode::NotFound, s.to_string())
            }
            VouchError::Storage(StorageError::WriteConflict { .. }) => ServiceError::new(
                ErrorCode::Conflict,
                "Record changed since it was read; retry the request",
            ),
            // Store failures, crypto failures, cache backend failures and
            // misconfiguration all collapse to a generic message; the detail
            // goes to the log, not to the caller.
            other => {
                tracing::error!(error = %other, "internal service error");
                ServiceError::new(ErrorCode::InternalError, "Internal error")
            }
        }
    }
}

/// Result type alias for the service layer.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use vouch_core::{CryptoError, StorageError};

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorCode::Unauthorized.http_status(), 401);
        assert_eq!(ErrorCode::ValidationFailed.http_status(), 400);
        assert_eq!(ErrorCode::MissingField.http_status(), 400);
        assert_eq!(ErrorCode::NotFound.http_status(), 404);
        assert_eq!(ErrorCode::Conflict.http_status(), 409);
        assert_eq!(ErrorCode::InternalError.http_status(), 500);
    }

    #[test]
    fn test_write_conflict_maps_to_conflict() {
        let err: ServiceError = VouchError::from(StorageError::WriteConflict {
            collection: "applicants".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.http_status(), 409);
    }

    #[test]
    fn test_validation_errors_pass_message_through() {
        let err: ServiceError = VouchError::from(ValidationError::RequiredFieldMissing {
            field: "first_name".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::MissingField);
        assert!(err.message.contains("first_name"));
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err: ServiceError = VouchError::from(StorageError::NotFound {
            collection: "applicants".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_crypto_errors_are_opaque_to_callers() {
        let err: ServiceError = VouchError::from(CryptoError::KeyProvider {
            operation: "generate_data_key".to_string(),
            reason: "kms unreachable at 10.0.0.5".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::InternalError);
        assert!(!err.message.contains("10.0.0.5"));
    }

    #[test]
    fn test_auth_errors_map_to_unauthorized() {
        let err: ServiceError = VouchError::from(AuthError::InvalidApiKey).into();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }
}
