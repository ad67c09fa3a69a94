//! Vouch Service
//!
//! Orchestration layer over the crypto and storage crates: record assembly,
//! applicant and document operations, API-key identity resolution, env
//! configuration, and the service error surface.
//!
//! Every operation follows the same discipline: validate before any side
//! effect, mutate the authoritative store before touching the cache, and
//! re-read through the consistency gate after a write so callers always see
//! a record at least as fresh as their own mutation.

pub mod applicants;
pub mod assembler;
pub mod auth;
pub mod config;
pub mod documents;
pub mod error;
pub mod fetch;
pub mod state;
pub mod telemetry;
pub mod types;

pub use applicants::ApplicantService;
pub use assembler::RecordAssembler;
pub use auth::{hash_api_key, ApiKeyAuthenticator};
pub use config::ServiceConfig;
pub use documents::DocumentService;
pub use error::{ErrorCode, ServiceError, ServiceResult};
pub use state::AppState;
