//! Key provider seam.
//!
//! Wraps a key-management service: issues one-time data keys and reverses
//! the wrapping of previously issued keys. Transport or permission errors
//! surface as `CryptoError::KeyProvider` and abort the enclosing operation;
//! retry policy belongs to the caller.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng as AeadOsRng, Payload},
    Aes256Gcm, Nonce,
};
use async_trait::async_trait;
use rand::RngCore;

use vouch_core::{CryptoError, VouchError, VouchResult};

use crate::key::{DataKey, PlainKey, KEY_LEN};

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// Associated data binding wrapped blobs to the key-wrap context.
const KEY_WRAP_AAD: &[u8] = b"vouch-key-wrap";

/// Issues one-time data keys and unwraps previously issued ones.
///
/// Each call to `generate_data_key` yields a cryptographically independent
/// key. The ciphertext half is opaque; only the provider's backing master
/// key can reverse it. Implementations must not retry internally.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// Generate a fresh data key: plaintext for immediate use, ciphertext
    /// for persistence alongside the record.
    async fn generate_data_key(&self) -> VouchResult<DataKey>;

    /// Unwrap a previously generated data key ciphertext.
    async fn decrypt_data_key(&self, ciphertext: &[u8]) -> VouchResult<PlainKey>;
}

/// Key provider backed by a local 32-byte master key.
///
/// Stands in for a remote KMS in development and tests: data keys are
/// wrapped with AES-256-GCM under the master key, so the ciphertext shape
/// matches what a real provider would return.
pub struct LocalKeyProvider {
    master: PlainKey,
}

impl LocalKeyProvider {
    pub fn new(master: PlainKey) -> Self {
        Self { master }
    }

    /// Construct with a random master key. Wrapped keys do not survive the
    /// process; only suitable for tests and throwaway environments.
    pub fn ephemeral() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self::new(PlainKey::from_bytes(bytes))
    }

    fn cipher(&self) -> Result<Aes256Gcm, VouchError> {
        Aes256Gcm::new_from_slice(self.master.as_bytes())
            .map_err(|_| CryptoError::InvalidKeyLength { expected: KEY_LEN }.into())
    }
}

#[async_trait]
impl KeyProvider for LocalKeyProvider {
    async fn generate_data_key(&self) -> VouchResult<DataKey> {
        let mut key_bytes = [0u8; KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut key_bytes);

        let cipher = self.cipher()?;
        let nonce = Aes256Gcm::generate_nonce(&mut AeadOsRng);
        let wrapped = cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: &key_bytes,
                    aad: KEY_WRAP_AAD,
                },
            )
            .map_err(|_| CryptoError::KeyProvider {
                operation: "generate_data_key".to_string(),
                reason: "key wrap failed".to_string(),
            })?;

        let mut ciphertext = Vec::with_capacity(NONCE_LEN + wrapped.len());
        ciphertext.extend_from_slice(&nonce);
        ciphertext.extend_from_slice(&wrapped);

        Ok(DataKey {
            plaintext: PlainKey::from_bytes(key_bytes),
            ciphertext,
        })
    }

    async fn decrypt_data_key(&self, ciphertext: &[u8]) -> VouchResult<PlainKey> {
        if ciphertext.len() < NONCE_LEN {
            return Err(CryptoError::Decryption.into());
        }
        let (nonce_bytes, wrapped) = ciphertext.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let cipher = self.cipher()?;
        let key_bytes = cipher
            .decrypt(
                nonce,
                Payload {
                    msg: wrapped,
                    aad: KEY_WRAP_AAD,
                },
            )
            .map_err(|_| CryptoError::Decryption)?;

        PlainKey::from_slice(&key_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_and_unwrap_roundtrip() {
        let provider = LocalKeyProvider::ephemeral();
        let data_key = provider.generate_data_key().await.unwrap();

        let unwrapped = provider.decrypt_data_key(&data_key.ciphertext).await.unwrap();
        assert_eq!(unwrapped.as_bytes(), data_key.plaintext.as_bytes());
    }

    #[tokio::test]
    async fn test_generated_keys_are_independent() {
        let provider = LocalKeyProvider::ephemeral();
        let a = provider.generate_data_key().await.unwrap();
        let b = provider.generate_data_key().await.unwrap();

        assert_ne!(a.plaintext.as_bytes(), b.plaintext.as_bytes());
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[tokio::test]
    async fn test_unwrap_with_wrong_master_fails() {
        let provider_a = LocalKeyProvider::ephemeral();
        let provider_b = LocalKeyProvider::ephemeral();

        let data_key = provider_a.generate_data_key().await.unwrap();
        let err = provider_b
            .decrypt_data_key(&data_key.ciphertext)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VouchError::Crypto(CryptoError::Decryption)
        ));
    }

    #[tokio::test]
    async fn test_unwrap_truncated_ciphertext_fails() {
        let provider = LocalKeyProvider::ephemeral();
        let err = provider.decrypt_data_key(&[0u8; 4]).await.unwrap_err();
        assert!(matches!(err, VouchError::Crypto(CryptoError::Decryption)));
    }

    #[tokio::test]
    async fn test_ciphertext_does_not_contain_plaintext_key() {
        let provider = LocalKeyProvider::ephemeral();
        let data_key = provider.generate_data_key().await.unwrap();

        let plain = data_key.plaintext.as_bytes();
        let window = plain.len();
        let leaked = data_key
            .ciphertext
            .windows(window)
            .any(|w| w == plain.as_slice());
        assert!(!leaked);
    }
}
