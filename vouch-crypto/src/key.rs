//! Data key types.

use zeroize::Zeroizing;

use vouch_core::{CryptoError, VouchError};

/// Symmetric key length (AES-256).
pub const KEY_LEN: usize = 32;

/// A plaintext symmetric key. Zeroized on drop; deliberately implements
/// neither `Serialize` nor `Debug`-with-contents so it cannot leak through
/// logging or persistence paths.
pub struct PlainKey(Zeroizing<[u8; KEY_LEN]>);

impl PlainKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Parse from a slice, rejecting anything that is not exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, VouchError> {
        let arr: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength { expected: KEY_LEN })?;
        Ok(Self(Zeroizing::new(arr)))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for PlainKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PlainKey(..)")
    }
}

/// A per-record data key: the ephemeral plaintext half plus the wrapped
/// ciphertext that is persisted alongside the record.
#[derive(Debug)]
pub struct DataKey {
    /// Ephemeral. Discarded as soon as the enclosing assemble or decrypt
    /// operation completes.
    pub plaintext: PlainKey,
    /// Opaque to everyone but the key provider that produced it.
    pub ciphertext: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        assert!(PlainKey::from_slice(&[0u8; 16]).is_err());
        assert!(PlainKey::from_slice(&[0u8; 33]).is_err());
        assert!(PlainKey::from_slice(&[0u8; 32]).is_ok());
    }

    #[test]
    fn test_debug_does_not_print_key_bytes() {
        let key = PlainKey::from_bytes([0xAB; 32]);
        let rendered = format!("{:?}", key);
        assert_eq!(rendered, "PlainKey(..)");
        assert!(!rendered.contains("171"));
    }
}
