//! Vouch Crypto - Envelope Encryption
//!
//! Per-record data keys wrapped by a key-management service, and a field
//! cipher that encrypts individual sensitive values with the plaintext half
//! of a data key.
//!
//! The plaintext half of a data key exists only in process memory for the
//! duration of the encrypt or decrypt operation that needs it. It is zeroized
//! on drop and is never serialized, logged, or persisted.

pub mod field;
pub mod key;
pub mod provider;

pub use field::{
    decrypt_address, decrypt_field, encrypt_address, encrypt_field, FIELD_FORMAT_VERSION,
};
pub use key::{DataKey, PlainKey, KEY_LEN};
pub use provider::{KeyProvider, LocalKeyProvider};
