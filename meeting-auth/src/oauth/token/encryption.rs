//! AES-256-GCM sealing for credentials stored at rest.
//!
//! The key is 32 bytes supplied as a hex string (64 characters). Sealed values
//! are `base64(nonce || ciphertext)` so they can live in a text file.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::Rng;

use crate::error::{storage_error, Error, ErrorKind, StorageErrorKind};

/// 12-byte nonce size for AES-GCM
const NONCE_SIZE: usize = 12;

/// A parsed AES-256-GCM key.
#[derive(Clone)]
pub struct Cipher {
    key: [u8; 32],
}

impl Cipher {
    /// Parse a 64-character hex key.
    pub fn from_hex(key_hex: &str) -> Result<Self, Error> {
        let bytes = hex::decode(key_hex.trim()).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::Storage(StorageErrorKind::EncryptionFailed),
        })?;
        let key: [u8; 32] = bytes.try_into().map_err(|_| {
            storage_error(
                StorageErrorKind::EncryptionFailed,
                "Encryption key must be 32 bytes",
            )
        })?;
        Ok(Self { key })
    }

    fn aes(&self) -> Result<Aes256Gcm, Error> {
        Aes256Gcm::new_from_slice(&self.key).map_err(|_| {
            storage_error(StorageErrorKind::EncryptionFailed, "Invalid AES key length")
        })
    }

    /// Encrypt `plaintext` under a fresh random nonce.
    pub fn seal(&self, plaintext: &str) -> Result<String, Error> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill(&mut nonce_bytes);

        let ciphertext = self
            .aes()?
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|_| storage_error(StorageErrorKind::EncryptionFailed, "Encryption failed"))?;

        let mut sealed = nonce_bytes.to_vec();
        sealed.extend(ciphertext);
        Ok(BASE64.encode(sealed))
    }

    /// Decrypt a value produced by [`Cipher::seal`].
    pub fn open(&self, sealed_b64: &str) -> Result<String, Error> {
        let sealed = BASE64.decode(sealed_b64).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::Storage(StorageErrorKind::DecryptionFailed),
        })?;

        if sealed.len() < NONCE_SIZE {
            return Err(storage_error(
                StorageErrorKind::DecryptionFailed,
                "Sealed value shorter than nonce",
            ));
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
        let plaintext = self
            .aes()?
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| storage_error(StorageErrorKind::DecryptionFailed, "Decryption failed"))?;

        String::from_utf8(plaintext).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::Storage(StorageErrorKind::DecryptionFailed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    #[test]
    fn test_seal_open_restores_plaintext() {
        let cipher = Cipher::from_hex(TEST_KEY).unwrap();
        let sealed = cipher.seal(r#"{"access_token":"ya29"}"#).unwrap();
        assert!(!sealed.contains("ya29"));
        assert_eq!(cipher.open(&sealed).unwrap(), r#"{"access_token":"ya29"}"#);
    }

    #[test]
    fn test_seal_uses_fresh_nonce() {
        let cipher = Cipher::from_hex(TEST_KEY).unwrap();
        assert_ne!(cipher.seal("same").unwrap(), cipher.seal("same").unwrap());
    }

    #[test]
    fn test_invalid_key_returns_encryption_failed() {
        let result = Cipher::from_hex("not-valid-hex!");
        assert!(matches!(
            result,
            Err(Error {
                error_kind: ErrorKind::Storage(StorageErrorKind::EncryptionFailed),
                ..
            })
        ));
        assert!(Cipher::from_hex("abcd").is_err());
    }

    #[test]
    fn test_wrong_key_returns_decryption_failed() {
        let sealed = Cipher::from_hex(TEST_KEY).unwrap().seal("secret").unwrap();
        let wrong = Cipher::from_hex(&"f".repeat(64)).unwrap();
        assert!(matches!(
            wrong.open(&sealed),
            Err(Error {
                error_kind: ErrorKind::Storage(StorageErrorKind::DecryptionFailed),
                ..
            })
        ));
    }

    #[test]
    fn test_truncated_value_returns_decryption_failed() {
        let cipher = Cipher::from_hex(TEST_KEY).unwrap();
        assert!(cipher.open("YWJj").is_err()); // "abc" in base64
        assert!(cipher.open("not_valid_base64!!!").is_err());
    }
}
