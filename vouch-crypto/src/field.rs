//! Field-level encryption.
//!
//! Encrypts individual sensitive values with the plaintext half of a data
//! key using AES-256-GCM. Encryption is randomized (fresh nonce per call);
//! decryption is the exact inverse for the same key.
//!
//! Wire format, then base64 for storage:
//!   [ nonce (12 bytes) | ciphertext + tag ]

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng as AeadOsRng, Payload},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use vouch_core::{
    CryptoError, EncryptedAddress, EncryptedField, RawAddress, VouchError, VouchResult,
};

use crate::key::{PlainKey, KEY_LEN};

/// Current encrypted-field wire format version.
pub const FIELD_FORMAT_VERSION: u8 = 1;

const NONCE_LEN: usize = 12;

/// Associated data binding ciphertexts to the field-encryption context.
const FIELD_AAD: &[u8] = b"vouch-field-v1";

fn cipher_for(key: &PlainKey) -> Result<Aes256Gcm, VouchError> {
    Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| CryptoError::InvalidKeyLength { expected: KEY_LEN }.into())
}

/// Encrypt a single field value. A fresh random nonce makes repeated calls
/// with identical inputs produce different ciphertexts.
pub fn encrypt_field(plaintext: &str, key: &PlainKey) -> VouchResult<EncryptedField> {
    let cipher = cipher_for(key)?;
    let nonce = Aes256Gcm::generate_nonce(&mut AeadOsRng);
    let ciphertext = cipher
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext.as_bytes(),
                aad: FIELD_AAD,
            },
        )
        .map_err(|_| CryptoError::Encryption)?;

    let mut wire = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    wire.extend_from_slice(&nonce);
    wire.extend_from_slice(&ciphertext);

    Ok(EncryptedField {
        version: FIELD_FORMAT_VERSION,
        data: BASE64.encode(wire),
    })
}

/// Decrypt a field value. Wrong key or tampered ciphertext yields
/// `CryptoError::Decryption`, never a silently wrong plaintext (the GCM tag
/// authenticates the ciphertext).
pub fn decrypt_field(field: &EncryptedField, key: &PlainKey) -> VouchResult<String> {
    if field.version != FIELD_FORMAT_VERSION {
        return Err(CryptoError::MalformedField.into());
    }
    let wire = BASE64
        .decode(&field.data)
        .map_err(|_| CryptoError::MalformedField)?;
    if wire.len() < NONCE_LEN {
        return Err(CryptoError::MalformedField.into());
    }
    let (nonce_bytes, ciphertext) = wire.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = cipher_for(key)?;
    let plaintext = cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad: FIELD_AAD,
            },
        )
        .map_err(|_| CryptoError::Decryption)?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::Decryption.into())
}

/// Encrypt each address component independently, so one component's
/// ciphertext never depends on another's plaintext.
pub fn encrypt_address(address: &RawAddress, key: &PlainKey) -> VouchResult<EncryptedAddress> {
    Ok(EncryptedAddress {
        line1: encrypt_field(&address.line1, key)?,
        line2: address
            .line2
            .as_deref()
            .map(|line2| encrypt_field(line2, key))
            .transpose()?,
        city: encrypt_field(&address.city, key)?,
        region: encrypt_field(&address.region, key)?,
        postal_code: encrypt_field(&address.postal_code, key)?,
        country: encrypt_field(&address.country, key)?,
    })
}

/// Decrypt every address component back to the submitted plaintext.
pub fn decrypt_address(address: &EncryptedAddress, key: &PlainKey) -> VouchResult<RawAddress> {
    Ok(RawAddress {
        line1: decrypt_field(&address.line1, key)?,
        line2: address
            .line2
            .as_ref()
            .map(|line2| decrypt_field(line2, key))
            .transpose()?,
        city: decrypt_field(&address.city, key)?,
        region: decrypt_field(&address.region, key)?,
        postal_code: decrypt_field(&address.postal_code, key)?,
        country: decrypt_field(&address.country, key)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> PlainKey {
        PlainKey::from_bytes([7u8; 32])
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = test_key();
        for value in ["1990-01-01", "", "ünïcødé", "a very long street name 123"] {
            let field = encrypt_field(value, &key).unwrap();
            assert_eq!(decrypt_field(&field, &key).unwrap(), value);
        }
    }

    #[test]
    fn test_encryption_is_randomized() {
        let key = test_key();
        let a = encrypt_field("1990-01-01", &key).unwrap();
        let b = encrypt_field("1990-01-01", &key).unwrap();
        assert_ne!(a.data, b.data);
    }

    #[test]
    fn test_ciphertext_does_not_contain_plaintext() {
        let key = test_key();
        let field = encrypt_field("1990-01-01", &key).unwrap();
        assert!(!field.data.contains("1990"));

        let raw = BASE64.decode(&field.data).unwrap();
        let needle = b"1990";
        assert!(!raw.windows(needle.len()).any(|w| w == needle));
    }

    #[test]
    fn test_wrong_key_yields_decryption_error() {
        let field = encrypt_field("1990-01-01", &test_key()).unwrap();
        let other = PlainKey::from_bytes([9u8; 32]);
        let err = decrypt_field(&field, &other).unwrap_err();
        assert!(matches!(err, VouchError::Crypto(CryptoError::Decryption)));
    }

    #[test]
    fn test_tampered_ciphertext_yields_decryption_error() {
        let key = test_key();
        let mut field = encrypt_field("1990-01-01", &key).unwrap();
        let mut raw = BASE64.decode(&field.data).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        field.data = BASE64.encode(raw);

        let err = decrypt_field(&field, &key).unwrap_err();
        assert!(matches!(err, VouchError::Crypto(CryptoError::Decryption)));
    }

    #[test]
    fn test_malformed_field_is_distinguished() {
        let key = test_key();

        let not_base64 = EncryptedField {
            version: FIELD_FORMAT_VERSION,
            data: "not base64!!".to_string(),
        };
        assert!(matches!(
            decrypt_field(&not_base64, &key).unwrap_err(),
            VouchError::Crypto(CryptoError::MalformedField)
        ));

        let unknown_version = EncryptedField {
            version: 99,
            data: BASE64.encode([0u8; 32]),
        };
        assert!(matches!(
            decrypt_field(&unknown_version, &key).unwrap_err(),
            VouchError::Crypto(CryptoError::MalformedField)
        ));
    }

    #[test]
    fn test_address_components_encrypt_independently() {
        let key = test_key();
        let address = RawAddress {
            line1: "1 Main St".to_string(),
            line2: None,
            city: "Springfield".to_string(),
            region: "IL".to_string(),
            postal_code: "62701".to_string(),
            country: "US".to_string(),
        };
        let encrypted = encrypt_address(&address, &key).unwrap();
        assert!(encrypted.line2.is_none());

        // Each component decrypts on its own.
        assert_eq!(decrypt_field(&encrypted.city, &key).unwrap(), "Springfield");
        assert_eq!(decrypt_field(&encrypted.country, &key).unwrap(), "US");
    }
}
