//! Document operations.
//!
//! Documents are embedded in their owning applicant record in the
//! authoritative store, but cached and addressed independently. Upload runs
//! validation and the MIME allow-list before any side effect; status updates
//! are positional array-element writes followed by invalidation and a fresh
//! gate read.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use vouch_core::{
    Applicant, ClientId, Document, DocumentStatus, DocumentType, Filter, StorageError,
    ValidationError, VouchResult,
};
use vouch_storage::{object_key_from_url, AuthoritativeStore, ProjectionFetcher, UpdateDoc};

use crate::applicants::{applicant_owner_filter, strictly_after};
use crate::assembler::RecordAssembler;
use crate::state::AppState;
use crate::types::{CreateDocumentResponse, UploadDocumentRequest, CREATED_STATUS};

/// Cache namespace for individual document projections. Not a physical
/// collection; documents live inside their applicant record.
const DOCUMENT_CACHE_COLLECTION: &str = "documents";

/// Map an accepted MIME type to the stored file extension. Anything outside
/// the allow-list is rejected before any upload or store write.
fn extension_for_mime(mime: &str) -> Result<&'static str, ValidationError> {
    match mime {
        "application/pdf" => Ok("pdf"),
        "image/jpeg" => Ok("jpg"),
        "image/png" => Ok("png"),
        other => Err(ValidationError::UnsupportedMimeType {
            mime: other.to_string(),
        }),
    }
}

/// Filter selecting the applicant that embeds a given live document.
fn document_owner_filter(client_id: &ClientId, document_id: Uuid) -> Filter {
    Filter::new()
        .eq("documents.document_id", document_id)
        .eq("client_id", client_id.as_str())
        .eq("deleted", false)
}

/// Cache-key filter for one document projection.
fn document_cache_filter(client_id: &ClientId, document_id: Uuid) -> Filter {
    Filter::new()
        .eq("document_id", document_id)
        .eq("client_id", client_id.as_str())
}

/// Fetches one embedded document from its owning applicant on cache miss.
struct EmbeddedDocumentFetcher {
    store: Arc<dyn AuthoritativeStore>,
    collection: String,
    owner_filter: Filter,
    document_id: Uuid,
}

#[async_trait]
impl ProjectionFetcher for EmbeddedDocumentFetcher {
    async fn fetch(&self) -> VouchResult<Option<Value>> {
        let Some(applicant) = self.store.find_one(&self.collection, &self.owner_filter).await?
        else {
            return Ok(None);
        };
        let wanted = json!(self.document_id);
        let found = applicant
            .get("documents")
            .and_then(Value::as_array)
            .and_then(|docs| {
                docs.iter().find(|doc| {
                    doc.get("document_id") == Some(&wanted)
                        && doc.get("deleted") != Some(&Value::Bool(true))
                })
            })
            .cloned();
        Ok(found)
    }
}

pub struct DocumentService {
    state: AppState,
}

impl DocumentService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    fn applicants_collection(&self) -> &str {
        &self.state.config.applicants_collection
    }

    /// Upload a document payload and attach the record to its applicant.
    pub async fn upload(
        &self,
        client_id: &ClientId,
        req: UploadDocumentRequest,
    ) -> VouchResult<CreateDocumentResponse> {
        let extension = extension_for_mime(&req.mime_type)?;
        let document_type = DocumentType::parse(&req.document_type)?;
        if req.data.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "data".to_string(),
                reason: "empty payload".to_string(),
            }
            .into());
        }
        if req.data.len() > self.state.config.max_upload_bytes {
            return Err(ValidationError::InvalidValue {
                field: "data".to_string(),
                reason: format!(
                    "payload exceeds limit of {} bytes",
                    self.state.config.max_upload_bytes
                ),
            }
            .into());
        }

        let applicant_filter = applicant_owner_filter(client_id, req.applicant_id);
        let owner = self
            .state
            .store
            .find_one(self.applicants_collection(), &applicant_filter)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                collection: self.applicants_collection().to_string(),
            })?;
        let owner: Applicant =
            serde_json::from_value(owner).map_err(|e| StorageError::MalformedRecord {
                collection: self.applicants_collection().to_string(),
                reason: e.to_string(),
            })?;

        let file_size = req.data.len() as u64;
        let mut document = RecordAssembler::assemble_document(
            req.applicant_id,
            document_type,
            &req.country,
            "",
            file_size,
        )?;

        let object_key = format!("documents/{}.{extension}", document.document_id);
        document.file_url = self
            .state
            .objects
            .upload(req.data, &object_key, &req.mime_type)
            .await?;

        let value =
            serde_json::to_value(&document).map_err(|e| StorageError::InsertFailed {
                collection: self.applicants_collection().to_string(),
                reason: e.to_string(),
            })?;
        let matched = self
            .state
            .store
            .update_one(
                self.applicants_collection(),
                &applicant_filter,
                &UpdateDoc::Push {
                    field: "documents".to_string(),
                    value,
                },
            )
            .await?;
        if matched == 0 {
            // The applicant vanished between the owner read and the push;
            // the payload already landed in the object store and must not
            // stay behind.
            if let Err(err) = self.state.objects.delete(&object_key).await {
                tracing::warn!(key = %object_key, error = %err, "orphaned upload cleanup failed");
            }
            return Err(StorageError::NotFound {
                collection: self.applicants_collection().to_string(),
            }
            .into());
        }
        self.state
            .store
            .update_one(
                self.applicants_collection(),
                &applicant_filter,
                &UpdateDoc::set_field("updated_at", json!(strictly_after(owner.updated_at))),
            )
            .await?;

        self.state
            .gate
            .invalidate(self.applicants_collection(), &applicant_filter)
            .await?;

        tracing::info!(
            document_id = %document.document_id,
            applicant_id = %req.applicant_id,
            "document uploaded"
        );
        Ok(CreateDocumentResponse {
            document_id: document.document_id,
            status: CREATED_STATUS.to_string(),
        })
    }

    /// Fetch one document through the consistency gate.
    pub async fn get(&self, client_id: &ClientId, document_id: Uuid) -> VouchResult<Document> {
        let cache_filter = document_cache_filter(client_id, document_id);
        let fetcher = EmbeddedDocumentFetcher {
            store: self.state.store.clone(),
            collection: self.applicants_collection().to_string(),
            owner_filter: document_owner_filter(client_id, document_id),
            document_id,
        };
        self.state
            .gate
            .get::<Document, _>(DOCUMENT_CACHE_COLLECTION, &cache_filter, &fetcher)
            .await?
            .ok_or_else(|| {
                StorageError::NotFound {
                    collection: DOCUMENT_CACHE_COLLECTION.to_string(),
                }
                .into()
            })
    }

    /// Transition a document's status and return the post-write record.
    ///
    /// An unknown status string or a disallowed transition causes zero store
    /// mutations. The write is a positional update touching only the matched
    /// array element.
    pub async fn update_status(
        &self,
        client_id: &ClientId,
        document_id: Uuid,
        requested: &str,
    ) -> VouchResult<Document> {
        let status = DocumentStatus::parse(requested)?;

        let owner_filter = document_owner_filter(client_id, document_id);
        let (owner, current) = self.find_owner_and_document(&owner_filter, document_id).await?;

        if !current.status.can_transition_to(status) {
            return Err(ValidationError::InvalidTransition {
                from: current.status.to_string(),
                to: status.to_string(),
            }
            .into());
        }

        let mut set = BTreeMap::new();
        set.insert("status".to_string(), json!(status));
        set.insert(
            "updated_at".to_string(),
            json!(strictly_after(current.updated_at)),
        );
        // Pin the status the transition was validated against. A concurrent
        // transition that committed first changes it, the pinned filter
        // matches no element, and the loser surfaces a conflict rather than
        // overwriting a state it never validated (terminal states included).
        let guarded = owner_filter
            .clone()
            .eq("documents.status", current.status.as_str());
        let matched = self
            .state
            .store
            .update_one(
                self.applicants_collection(),
                &guarded,
                &UpdateDoc::SetMatched {
                    array: "documents".to_string(),
                    set,
                },
            )
            .await?;
        if matched == 0 {
            return Err(StorageError::WriteConflict {
                collection: DOCUMENT_CACHE_COLLECTION.to_string(),
            }
            .into());
        }
        self.state
            .store
            .update_one(
                self.applicants_collection(),
                &owner_filter,
                &UpdateDoc::set_field("updated_at", json!(strictly_after(owner.updated_at))),
            )
            .await?;

        // Both projections of the mutated record must go: the document's own
        // entry and the owning applicant's.
        self.state
            .gate
            .invalidate(
                DOCUMENT_CACHE_COLLECTION,
                &document_cache_filter(client_id, document_id),
            )
            .await?;
        self.state
            .gate
            .invalidate(
                self.applicants_collection(),
                &applicant_owner_filter(client_id, owner.applicant_id),
            )
            .await?;

        tracing::info!(document_id = %document_id, status = %status, "document status updated");
        self.get(client_id, document_id).await
    }

    /// Download a document's payload from the object store.
    pub async fn download(&self, client_id: &ClientId, document_id: Uuid) -> VouchResult<Vec<u8>> {
        let document = self.get(client_id, document_id).await?;
        let key = object_key_from_url(&document.file_url)?;
        self.state.objects.download(&key).await
    }

    async fn find_owner_and_document(
        &self,
        owner_filter: &Filter,
        document_id: Uuid,
    ) -> VouchResult<(Applicant, Document)> {
        let owner = self
            .state
            .store
            .find_one(self.applicants_collection(), owner_filter)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                collection: DOCUMENT_CACHE_COLLECTION.to_string(),
            })?;
        let owner: Applicant =
            serde_json::from_value(owner).map_err(|e| StorageError::MalformedRecord {
                collection: self.applicants_collection().to_string(),
                reason: e.to_string(),
            })?;
        let document = owner
            .documents
            .iter()
            .find(|doc| doc.document_id == document_id && !doc.deleted)
            .cloned()
            .ok_or(StorageError::NotFound {
                collection: DOCUMENT_CACHE_COLLECTION.to_string(),
            })?;
        Ok((owner, document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_allow_list() {
        assert_eq!(extension_for_mime("application/pdf").unwrap(), "pdf");
        assert_eq!(extension_for_mime("image/jpeg").unwrap(), "jpg");
        assert_eq!(extension_for_mime("image/png").unwrap(), "png");

        for rejected in ["image/gif", "text/html", "application/octet-stream", ""] {
            assert!(matches!(
                extension_for_mime(rejected).unwrap_err(),
                ValidationError::UnsupportedMimeType { .. }
            ));
        }
    }

    #[test]
    fn test_owner_filter_uses_dotted_path() {
        let client = ClientId::new("c1");
        let id = Uuid::now_v7();
        let filter = document_owner_filter(&client, id);
        assert!(filter.get("documents.document_id").is_some());
        assert!(filter.get("deleted").is_some());
    }
}
