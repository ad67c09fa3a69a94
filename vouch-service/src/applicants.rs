//! Applicant operations.
//!
//! Create validates before the key provider is contacted, so a bad request
//! or a provider failure leaves the store untouched. Reads go through the
//! consistency gate; updates mutate the store first, invalidate, then
//! re-read through the gate so the returned record is at least as fresh as
//! the write (a later concurrent write may already be visible, which is
//! accepted).

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use vouch_core::{
    Applicant, ApplicantStatus, ClientId, CryptoError, Filter, StorageError, ValidationError,
    VouchResult,
};
use vouch_crypto::{decrypt_address, decrypt_field};
use vouch_storage::UpdateDoc;

use crate::assembler::RecordAssembler;
use crate::fetch::FindOneFetcher;
use crate::state::AppState;
use crate::types::{
    CreateApplicantRequest, CreateApplicantResponse, RevealedApplicant, UpdateApplicantRequest,
    CREATED_STATUS,
};

/// Filter selecting one live applicant owned by one client. Shared with the
/// document service so invalidation and population always derive the same
/// cache key.
pub(crate) fn applicant_owner_filter(client_id: &ClientId, applicant_id: Uuid) -> Filter {
    Filter::new()
        .eq("applicant_id", applicant_id)
        .eq("client_id", client_id.as_str())
        .eq("deleted", false)
}

/// A timestamp strictly after `previous`, even when the wall clock has not
/// advanced since the record was last written. `previous` must be the value
/// the write filter pins; monotonicity holds because a concurrent writer
/// that moved the timestamp makes the pinned filter miss instead.
pub(crate) fn strictly_after(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}

/// The stored string form of a timestamp, for pinning it in a write filter.
/// Goes through the same serialization as the persisted record so the two
/// representations compare equal.
pub(crate) fn timestamp_literal(at: DateTime<Utc>) -> VouchResult<String> {
    serde_json::to_value(at)
        .ok()
        .and_then(|v| v.as_str().map(str::to_owned))
        .ok_or_else(|| {
            StorageError::MalformedRecord {
                collection: "timestamps".to_string(),
                reason: "timestamp did not serialize to a string".to_string(),
            }
            .into()
        })
}

pub struct ApplicantService {
    state: AppState,
}

impl ApplicantService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    fn collection(&self) -> &str {
        &self.state.config.applicants_collection
    }

    /// Create an applicant: validate, generate a data key, encrypt, insert.
    pub async fn create(
        &self,
        client_id: &ClientId,
        req: CreateApplicantRequest,
    ) -> VouchResult<CreateApplicantResponse> {
        RecordAssembler::validate_applicant(&req)?;

        let data_key = self.state.key_provider.generate_data_key().await?;
        let applicant = RecordAssembler::assemble_applicant(client_id, &req, &data_key)?;

        let document =
            serde_json::to_value(&applicant).map_err(|e| StorageError::InsertFailed {
                collection: self.collection().to_string(),
                reason: e.to_string(),
            })?;
        self.state.store.insert_one(self.collection(), document).await?;

        tracing::info!(
            applicant_id = %applicant.applicant_id,
            client_id = %client_id,
            "applicant created"
        );
        Ok(CreateApplicantResponse {
            applicant_id: applicant.applicant_id,
            status: CREATED_STATUS.to_string(),
        })
    }

    /// Fetch one applicant through the consistency gate.
    pub async fn get(&self, client_id: &ClientId, applicant_id: Uuid) -> VouchResult<Applicant> {
        let filter = applicant_owner_filter(client_id, applicant_id);
        let fetcher =
            FindOneFetcher::new(self.state.store.clone(), self.collection(), filter.clone());
        self.state
            .gate
            .get::<Applicant, _>(self.collection(), &filter, &fetcher)
            .await?
            .ok_or_else(|| {
                StorageError::NotFound {
                    collection: self.collection().to_string(),
                }
                .into()
            })
    }

    /// List all live applicants owned by a client. Served straight from the
    /// authoritative store; list projections are not cached.
    pub async fn list(&self, client_id: &ClientId) -> VouchResult<Vec<Applicant>> {
        let filter = Filter::new()
            .eq("client_id", client_id.as_str())
            .eq("deleted", false);
        let documents = self.state.store.find(self.collection(), &filter).await?;
        documents
            .into_iter()
            .map(|doc| {
                serde_json::from_value(doc).map_err(|e| {
                    StorageError::MalformedRecord {
                        collection: self.collection().to_string(),
                        reason: e.to_string(),
                    }
                    .into()
                })
            })
            .collect()
    }

    /// Apply an allow-listed partial update and return the post-write record.
    ///
    /// An unknown or disallowed status causes zero store mutations. The
    /// update is a scoped field set, never a record overwrite.
    pub async fn update(
        &self,
        client_id: &ClientId,
        applicant_id: Uuid,
        req: UpdateApplicantRequest,
    ) -> VouchResult<Applicant> {
        if req.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "update".to_string(),
                reason: "no updatable fields present".to_string(),
            }
            .into());
        }

        let filter = applicant_owner_filter(client_id, applicant_id);
        let current = self
            .state
            .store
            .find_one(self.collection(), &filter)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                collection: self.collection().to_string(),
            })?;
        let current: Applicant =
            serde_json::from_value(current).map_err(|e| StorageError::MalformedRecord {
                collection: self.collection().to_string(),
                reason: e.to_string(),
            })?;

        let mut set = BTreeMap::new();
        if let Some(requested) = &req.status {
            let status = ApplicantStatus::parse(requested)?;
            if !current.status.can_transition_to(status) {
                return Err(ValidationError::InvalidTransition {
                    from: current.status.to_string(),
                    to: status.to_string(),
                }
                .into());
            }
            set.insert("status".to_string(), json!(status));
        }
        if let Some(level) = &req.verification_level {
            if level.trim().is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: "verification_level".to_string(),
                    reason: "must not be empty".to_string(),
                }
                .into());
            }
            set.insert("verification_level".to_string(), json!(level));
        }
        if let Some(email) = &req.email {
            if !email.contains('@') {
                return Err(ValidationError::InvalidValue {
                    field: "email".to_string(),
                    reason: "not an email address".to_string(),
                }
                .into());
            }
            set.insert("email".to_string(), json!(email));
        }
        if let Some(phone) = &req.phone {
            if phone.trim().is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: "phone".to_string(),
                    reason: "must not be empty".to_string(),
                }
                .into());
            }
            set.insert("phone".to_string(), json!(phone));
        }
        set.insert(
            "updated_at".to_string(),
            json!(strictly_after(current.updated_at)),
        );

        // Pin the snapshot this update was validated against. A concurrent
        // writer that committed in between moves `updated_at`, the pinned
        // filter misses, and this update becomes a conflict instead of
        // silently overwriting a state it never saw.
        let guarded = filter
            .clone()
            .eq("updated_at", timestamp_literal(current.updated_at)?);
        let matched = self
            .state
            .store
            .update_one(self.collection(), &guarded, &UpdateDoc::Set(set))
            .await?;
        if matched == 0 {
            return Err(StorageError::WriteConflict {
                collection: self.collection().to_string(),
            }
            .into());
        }

        // The store has acknowledged; only now may the stale entry go.
        self.state.gate.invalidate(self.collection(), &filter).await?;

        tracing::info!(applicant_id = %applicant_id, "applicant updated");
        self.get(client_id, applicant_id).await
    }

    /// Decrypt an applicant's PII on demand. Reads never auto-decrypt; this
    /// is the only path that unwraps the record's data key.
    pub async fn reveal(
        &self,
        client_id: &ClientId,
        applicant_id: Uuid,
    ) -> VouchResult<RevealedApplicant> {
        let applicant = self.get(client_id, applicant_id).await?;

        let wrapped = BASE64
            .decode(&applicant.encrypted.encrypted_key)
            .map_err(|_| CryptoError::MalformedField)?;
        let key = self.state.key_provider.decrypt_data_key(&wrapped).await?;

        let dob = decrypt_field(&applicant.encrypted.dob, &key)?;
        let address = decrypt_address(&applicant.encrypted.address, &key)?;

        tracing::info!(applicant_id = %applicant_id, "applicant revealed");
        Ok(RevealedApplicant {
            applicant_id,
            dob,
            address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strictly_after_monotonic() {
        let past = Utc::now() - Duration::seconds(10);
        assert!(strictly_after(past) > past);

        let future = Utc::now() + Duration::seconds(10);
        assert!(strictly_after(future) > future);
    }

    #[test]
    fn test_timestamp_literal_matches_serialized_form() {
        let now = Utc::now();
        let literal = timestamp_literal(now).unwrap();
        // Must compare equal to the string a persisted record carries.
        assert_eq!(json!(now), json!(literal));
    }

    #[test]
    fn test_owner_filter_is_order_independent() {
        let client = ClientId::new("c1");
        let id = Uuid::now_v7();
        let a = applicant_owner_filter(&client, id);
        let b = Filter::new()
            .eq("deleted", false)
            .eq("client_id", "c1")
            .eq("applicant_id", id);
        assert_eq!(a, b);
    }
}
