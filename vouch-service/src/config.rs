//! Service configuration.
//!
//! Loaded from environment variables with development defaults. The master
//! key is the only secret; it is kept as hex in the config struct and parsed
//! into key bytes on demand so the struct stays `Debug`-safe (the Debug impl
//! redacts it).

use std::time::Duration;

use vouch_core::ConfigError;

/// Length of the master key in bytes (AES-256).
const MASTER_KEY_LEN: usize = 32;

/// Service configuration.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Hex-encoded 32-byte master key for the local key provider. Unset
    /// means the service runs with an ephemeral key (dev/test only).
    pub master_key_hex: Option<String>,

    /// TTL for cache entries populated by the gate.
    pub cache_ttl_secs: u64,

    /// Collection holding applicant records.
    pub applicants_collection: String,

    /// Collection holding hashed client API credentials.
    pub credentials_collection: String,

    /// Maximum accepted document upload size in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            master_key_hex: None,
            cache_ttl_secs: 3600,
            applicants_collection: "applicants".to_string(),
            credentials_collection: "client_credentials".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ServiceConfig {
    /// Create ServiceConfig from environment variables.
    ///
    /// Environment variables:
    /// - `VOUCH_MASTER_KEY`: hex-encoded 32-byte master key (unset = ephemeral)
    /// - `VOUCH_CACHE_TTL_SECS`: cache entry TTL (default: 3600)
    /// - `VOUCH_APPLICANTS_COLLECTION`: collection name (default: "applicants")
    /// - `VOUCH_CREDENTIALS_COLLECTION`: collection name (default: "client_credentials")
    /// - `VOUCH_MAX_UPLOAD_BYTES`: upload size limit (default: 10485760)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let master_key_hex = std::env::var("VOUCH_MASTER_KEY")
            .ok()
            .filter(|s| !s.is_empty());

        let cache_ttl_secs = std::env::var("VOUCH_CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cache_ttl_secs);

        let applicants_collection = std::env::var("VOUCH_APPLICANTS_COLLECTION")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.applicants_collection);

        let credentials_collection = std::env::var("VOUCH_CREDENTIALS_COLLECTION")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.credentials_collection);

        let max_upload_bytes = std::env::var("VOUCH_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_upload_bytes);

        Self {
            master_key_hex,
            cache_ttl_secs,
            applicants_collection,
            credentials_collection,
            max_upload_bytes,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Parse the configured master key, if any.
    pub fn master_key_bytes(&self) -> Result<Option<[u8; MASTER_KEY_LEN]>, ConfigError> {
        let Some(hex_str) = &self.master_key_hex else {
            return Ok(None);
        };
        let bytes = hex::decode(hex_str).map_err(|e| ConfigError::InvalidValue {
            field: "VOUCH_MASTER_KEY".to_string(),
            value: "<redacted>".to_string(),
            reason: e.to_string(),
        })?;
        let arr: [u8; MASTER_KEY_LEN] =
            bytes.try_into().map_err(|_| ConfigError::InvalidValue {
                field: "VOUCH_MASTER_KEY".to_string(),
                value: "<redacted>".to_string(),
                reason: format!("expected {MASTER_KEY_LEN} bytes"),
            })?;
        Ok(Some(arr))
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field(
                "master_key_hex",
                &self.master_key_hex.as_ref().map(|_| "<redacted>"),
            )
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("applicants_collection", &self.applicants_collection)
            .field("credentials_collection", &self.credentials_collection)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert!(config.master_key_hex.is_none());
        assert_eq!(config.cache_ttl_secs, 3600);
        assert_eq!(config.applicants_collection, "applicants");
        assert_eq!(config.credentials_collection, "client_credentials");
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_master_key_parsing() {
        let mut config = ServiceConfig::default();
        assert!(config.master_key_bytes().unwrap().is_none());

        config.master_key_hex = Some("ab".repeat(32));
        let key = config.master_key_bytes().unwrap().unwrap();
        assert_eq!(key, [0xab; 32]);

        config.master_key_hex = Some("abcd".to_string());
        assert!(config.master_key_bytes().is_err());

        config.master_key_hex = Some("not hex".to_string());
        assert!(config.master_key_bytes().is_err());
    }

    #[test]
    fn test_debug_redacts_master_key() {
        let config = ServiceConfig {
            master_key_hex: Some("ab".repeat(32)),
            ..ServiceConfig::default()
        };
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("abab"));
    }
}
