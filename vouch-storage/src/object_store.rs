//! Object store seam for document payloads.

use async_trait::async_trait;

use vouch_core::{StorageError, VouchResult};

/// Upload/download contract for document payloads. Uploads are safe for the
/// caller to retry, and the returned URL round-trips back to the object key
/// through `object_key_from_url`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a payload under `key`, returning the public URL.
    async fn upload(&self, data: Vec<u8>, key: &str, content_type: &str) -> VouchResult<String>;

    /// Download the payload stored under `key`.
    async fn download(&self, key: &str) -> VouchResult<Vec<u8>>;

    /// Remove the payload stored under `key`. Deleting an absent key is not
    /// an error; callers use this to clean up uploads whose record write
    /// never landed.
    async fn delete(&self, key: &str) -> VouchResult<()>;
}

/// Extract the object key from a store URL: everything after the host
/// segment. Deterministic inverse of the URL the store hands back on upload.
pub fn object_key_from_url(url: &str) -> VouchResult<String> {
    let after_scheme = url
        .split_once("://")
        .map(|(_, rest)| rest)
        .ok_or_else(|| StorageError::InvalidObjectUrl {
            url: url.to_string(),
        })?;
    let key = after_scheme
        .split_once('/')
        .map(|(_, key)| key)
        .unwrap_or_default();
    if key.is_empty() {
        return Err(StorageError::InvalidObjectUrl {
            url: url.to_string(),
        }
        .into());
    }
    Ok(key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_extraction() {
        let key = object_key_from_url("https://bucket.example.com/abc123.pdf").unwrap();
        assert_eq!(key, "abc123.pdf");

        let key = object_key_from_url("https://host/dir/abc.png").unwrap();
        assert_eq!(key, "dir/abc.png");
    }

    #[test]
    fn test_rejects_urls_without_key() {
        assert!(object_key_from_url("https://host/").is_err());
        assert!(object_key_from_url("https://host").is_err());
        assert!(object_key_from_url("not a url").is_err());
    }
}
