//! API-key identity resolution.
//!
//! Client organizations authenticate with an opaque API key. Only the
//! SHA-256 hash of the key is stored; resolution hashes the presented key
//! and looks the hash up against active credentials. The resolved
//! `ClientId` is what every downstream operation scopes its queries by.

use std::sync::Arc;

use vouch_core::{
    sha256_bytes, AuthError, ClientCredential, ClientId, Filter, StorageError, VouchResult,
};
use vouch_storage::AuthoritativeStore;

/// Hash an API key for storage or lookup.
pub fn hash_api_key(api_key: &str) -> String {
    hex::encode(sha256_bytes(api_key.as_bytes()))
}

pub struct ApiKeyAuthenticator {
    store: Arc<dyn AuthoritativeStore>,
    collection: String,
}

impl ApiKeyAuthenticator {
    pub fn new(store: Arc<dyn AuthoritativeStore>, collection: &str) -> Self {
        Self {
            store,
            collection: collection.to_string(),
        }
    }

    /// Resolve a presented API key to a client id.
    ///
    /// Fails with `MissingApiKey` when no key was presented and
    /// `InvalidApiKey` when the hash matches no active credential. Revoked
    /// and deleted credentials are indistinguishable from unknown keys.
    pub async fn resolve(&self, api_key: Option<&str>) -> VouchResult<ClientId> {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .ok_or(AuthError::MissingApiKey)?;

        let filter = Filter::new()
            .eq("client_secret_hash", hash_api_key(api_key))
            .eq("revoked", false);

        let Some(doc) = self.store.find_one(&self.collection, &filter).await? else {
            return Err(AuthError::InvalidApiKey.into());
        };

        let credential: ClientCredential =
            serde_json::from_value(doc).map_err(|e| StorageError::MalformedRecord {
                collection: self.collection.clone(),
                reason: e.to_string(),
            })?;

        if credential.deleted_at.is_some() {
            return Err(AuthError::InvalidApiKey.into());
        }

        Ok(ClientId::new(credential.client_id))
    }
}
