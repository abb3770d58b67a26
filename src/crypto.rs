//! Secret encryption module using AES-256-GCM
//!
//! This module provides the encryption and decryption utilities for
//! repository passwords stored in the database, using AES-256-GCM with
//! additional authenticated data (AAD) binding each ciphertext to its
//! owning connector record.

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
};
use thiserror::Error;
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

const VERSION_ENCRYPTED: u8 = 0x01;
const VERSION_FIELD_LEN: usize = 1;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const MIN_ENCRYPTED_LEN: usize = VERSION_FIELD_LEN + NONCE_LEN + TAG_LEN;

/// Crypto error types
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
    #[error("invalid ciphertext format")]
    InvalidFormat,
    #[error("empty ciphertext")]
    EmptyCiphertext,
}

/// Secure wrapper for encryption keys with zeroization
#[derive(Debug, Clone, Zeroize, ZeroizeOnDrop)]
pub struct ZeroizingKey(Vec<u8>);

/// Type alias for crypto keys
pub type CryptoKey = ZeroizingKey;

impl CryptoKey {
    /// Create a new crypto key from bytes
    pub fn new(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::EncryptionFailed(
                "Invalid key length: expected 32 bytes".to_string(),
            ));
        }
        Ok(ZeroizingKey(bytes))
    }

    /// Get the key as bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Encrypt bytes using AES-256-GCM
pub fn encrypt_bytes(
    key: &CryptoKey,
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher_key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
    let cipher = Aes256Gcm::new(cipher_key);

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let mut ciphertext = cipher
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    // Payload layout: version byte, nonce, ciphertext+tag
    let mut result = Vec::with_capacity(VERSION_FIELD_LEN + NONCE_LEN + ciphertext.len());
    result.push(VERSION_ENCRYPTED);
    result.extend_from_slice(&nonce);
    result.append(&mut ciphertext);

    Ok(result)
}

/// Decrypt bytes using AES-256-GCM
///
/// Unlike a plaintext-tolerant scheme, an unversioned payload is rejected:
/// stored secrets are always codec output, so anything else is corruption.
pub fn decrypt_bytes(
    key: &CryptoKey,
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.is_empty() {
        return Err(CryptoError::EmptyCiphertext);
    }

    if ciphertext[0] != VERSION_ENCRYPTED || ciphertext.len() < MIN_ENCRYPTED_LEN {
        return Err(CryptoError::InvalidFormat);
    }

    let nonce = Nonce::from_slice(&ciphertext[VERSION_FIELD_LEN..VERSION_FIELD_LEN + NONCE_LEN]);
    let tag_and_ct = &ciphertext[VERSION_FIELD_LEN + NONCE_LEN..];

    let cipher_key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
    let cipher = Aes256Gcm::new(cipher_key);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: tag_and_ct,
                aad,
            },
        )
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

/// Determine if a payload is using the encrypted format
pub fn is_encrypted_payload(ciphertext: &[u8]) -> bool {
    ciphertext.len() >= MIN_ENCRYPTED_LEN && ciphertext[0] == VERSION_ENCRYPTED
}

fn connector_aad(connector_id: Uuid) -> String {
    format!("git-connector|{}", connector_id)
}

/// Encrypt a repository password for the given connector
pub fn encrypt_connector_password(
    key: &CryptoKey,
    connector_id: Uuid,
    password: &str,
) -> Result<Vec<u8>, CryptoError> {
    let aad = connector_aad(connector_id);
    encrypt_bytes(key, aad.as_bytes(), password.as_bytes())
}

/// Decrypt a stored repository password for the given connector
pub fn decrypt_connector_password(
    key: &CryptoKey,
    connector_id: Uuid,
    ciphertext: &[u8],
) -> Result<String, CryptoError> {
    let aad = connector_aad(connector_id);
    let bytes = decrypt_bytes(key, aad.as_bytes(), ciphertext)?;
    String::from_utf8(bytes)
        .map_err(|e| CryptoError::DecryptionFailed(format!("Invalid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> CryptoKey {
        CryptoKey::new(vec![0u8; 32]).expect("valid test key")
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = test_key();
        let aad = b"test-aad";
        let plaintext = b"secret message";

        let encrypted = encrypt_bytes(&key, aad, plaintext).expect("encryption succeeds");
        let decrypted = decrypt_bytes(&key, aad, &encrypted).expect("decryption succeeds");

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_different_aad_fails() {
        let key = test_key();
        let plaintext = b"secret message";

        let encrypted = encrypt_bytes(&key, b"aad-1", plaintext).expect("encryption succeeds");
        let result = decrypt_bytes(&key, b"aad-2", &encrypted);

        assert!(result.is_err());
    }

    #[test]
    fn test_modified_ciphertext_fails() {
        let key = test_key();
        let aad = b"test-aad";

        let mut encrypted = encrypt_bytes(&key, aad, b"secret message").expect("encryption succeeds");
        encrypted[13] ^= 0x01;

        let result = decrypt_bytes(&key, aad, &encrypted);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_plaintext_works() {
        let key = test_key();
        let aad = b"test-aad";

        let encrypted = encrypt_bytes(&key, aad, b"").expect("encryption succeeds");
        let decrypted = decrypt_bytes(&key, aad, &encrypted).expect("decryption succeeds");

        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_nonce_uniqueness() {
        let key = test_key();
        let aad = b"test-aad";
        let plaintext = b"secret message";

        let encrypted1 = encrypt_bytes(&key, aad, plaintext).expect("encryption succeeds");
        let encrypted2 = encrypt_bytes(&key, aad, plaintext).expect("encryption succeeds");

        // Nonces (bytes 1-13) should be different
        assert_ne!(&encrypted1[1..13], &encrypted2[1..13]);
        assert_eq!(
            decrypt_bytes(&key, aad, &encrypted1).expect("decryption succeeds"),
            plaintext
        );
        assert_eq!(
            decrypt_bytes(&key, aad, &encrypted2).expect("decryption succeeds"),
            plaintext
        );
    }

    #[test]
    fn test_unversioned_payload_rejected() {
        let key = test_key();
        let result = decrypt_bytes(&key, b"test-aad", b"not-codec-output");

        assert!(matches!(result, Err(CryptoError::InvalidFormat)));
    }

    #[test]
    fn test_insufficient_ciphertext_length() {
        let key = test_key();
        let short_ciphertext = vec![VERSION_ENCRYPTED, 0x02];

        let result = decrypt_bytes(&key, b"test-aad", &short_ciphertext);
        assert!(matches!(result, Err(CryptoError::InvalidFormat)));
    }

    #[test]
    fn test_invalid_key_length_rejected() {
        assert!(CryptoKey::new(vec![0u8; 16]).is_err());
        assert!(CryptoKey::new(vec![0u8; 64]).is_err());
    }

    #[test]
    fn test_connector_password_roundtrip() {
        let key = test_key();
        let connector_id = Uuid::new_v4();

        let ciphertext =
            encrypt_connector_password(&key, connector_id, "secret").expect("encryption succeeds");
        assert_ne!(ciphertext.as_slice(), b"secret");
        assert!(is_encrypted_payload(&ciphertext));

        let plaintext = decrypt_connector_password(&key, connector_id, &ciphertext)
            .expect("decryption succeeds");
        assert_eq!(plaintext, "secret");
    }

    #[test]
    fn test_connector_password_bound_to_connector() {
        let key = test_key();
        let ciphertext = encrypt_connector_password(&key, Uuid::new_v4(), "secret")
            .expect("encryption succeeds");

        // Ciphertext produced for one connector must not decrypt for another
        let result = decrypt_connector_password(&key, Uuid::new_v4(), &ciphertext);
        assert!(result.is_err());
    }
}
