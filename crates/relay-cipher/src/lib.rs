//! Passphrase-keyed authenticated encryption for outbound payloads.
//!
//! Key material is derived on demand from a user-controlled passphrase
//! via PBKDF2-HMAC-SHA256 with a per-call random salt; it is never
//! stored in derived form or cached between calls. Payloads are sealed
//! with AES-256-GCM and serialized as a base64 blob of
//! `salt || nonce || ciphertext || tag`.
//!
//! Decryption fails closed: a tag mismatch or a truncated blob yields a
//! distinguishable error, never corrupted plaintext. Whether the
//! forwarding path encrypts at all is caller policy, not decided here.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;
const PBKDF2_ITERATIONS: u32 = 65_536;

/// Result type alias for cipher operations.
pub type Result<T> = std::result::Result<T, CipherError>;

/// Failure modes of encryption and decryption.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    /// The blob is not valid base64 or is too short to contain a salt,
    /// nonce, and tag.
    #[error("ciphertext blob is malformed: {0}")]
    Malformed(String),

    /// The authentication tag did not verify. Wrong passphrase or
    /// tampered ciphertext; no plaintext is returned.
    #[error("authentication failed during decryption")]
    AuthenticationFailed,

    /// The cipher could not seal the plaintext.
    #[error("encryption failed")]
    EncryptionFailed,
}

/// Authenticated symmetric cipher keyed by a passphrase.
#[derive(Debug, Clone)]
pub struct SecretCipher {
    passphrase: String,
}

impl SecretCipher {
    /// Creates a cipher for the given passphrase.
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self { passphrase: passphrase.into() }
    }

    /// Encrypts `plaintext` into a transportable base64 blob.
    ///
    /// A fresh salt and nonce are drawn per call, so encrypting the same
    /// plaintext twice never yields the same blob.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        let mut rng = rand::rng();
        rng.fill_bytes(&mut salt);
        rng.fill_bytes(&mut nonce);

        let key = self.derive_key(&salt);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

        // The aead crate appends the tag, matching the blob layout.
        let sealed = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| CipherError::EncryptionFailed)?;

        let mut blob = Vec::with_capacity(SALT_LEN + NONCE_LEN + sealed.len());
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&sealed);

        Ok(BASE64.encode(blob))
    }

    /// Decrypts a blob produced by [`encrypt`](Self::encrypt).
    ///
    /// The key is re-derived from the salt embedded in the blob and the
    /// tag is verified before any plaintext is returned.
    pub fn decrypt(&self, blob: &str) -> Result<String> {
        let raw = BASE64
            .decode(blob)
            .map_err(|e| CipherError::Malformed(format!("invalid base64: {e}")))?;

        if raw.len() < SALT_LEN + NONCE_LEN + TAG_LEN {
            return Err(CipherError::Malformed(format!(
                "blob of {} bytes cannot hold salt, nonce, and tag",
                raw.len()
            )));
        }

        let (salt, rest) = raw.split_at(SALT_LEN);
        let (nonce, sealed) = rest.split_at(NONCE_LEN);

        let key = self.derive_key(salt);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CipherError::AuthenticationFailed)?;

        String::from_utf8(plaintext)
            .map_err(|e| CipherError::Malformed(format!("plaintext is not UTF-8: {e}")))
    }

    fn derive_key(&self, salt: &[u8]) -> [u8; KEY_LEN] {
        let mut key = [0u8; KEY_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(
            self.passphrase.as_bytes(),
            salt,
            PBKDF2_ITERATIONS,
            &mut key,
        );
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_plaintext() {
        let cipher = SecretCipher::new("my secret phrase");
        let blob = cipher.encrypt("Hello, World!").expect("encrypt");
        assert_eq!(cipher.decrypt(&blob).expect("decrypt"), "Hello, World!");
    }

    #[test]
    fn round_trip_long_text() {
        let cipher = SecretCipher::new("my secret phrase");
        let text = "This is a much longer text that spans multiple lines.\n".repeat(10);
        let blob = cipher.encrypt(&text).expect("encrypt");
        assert_eq!(cipher.decrypt(&blob).expect("decrypt"), text);
    }

    #[test]
    fn round_trip_empty_string() {
        let cipher = SecretCipher::new("my secret phrase");
        let blob = cipher.encrypt("").expect("encrypt");
        assert_eq!(cipher.decrypt(&blob).expect("decrypt"), "");
    }

    #[test]
    fn wrong_passphrase_fails_closed() {
        let blob = SecretCipher::new("key1").encrypt("Secret message").expect("encrypt");
        let result = SecretCipher::new("key2").decrypt(&blob);
        assert_eq!(result, Err(CipherError::AuthenticationFailed));
    }

    #[test]
    fn encrypting_twice_yields_distinct_blobs() {
        let cipher = SecretCipher::new("my secret phrase");
        let a = cipher.encrypt("same input").expect("encrypt");
        let b = cipher.encrypt("same input").expect("encrypt");
        assert_ne!(a, b, "salt and nonce must be fresh per call");
    }

    #[test]
    fn truncated_blob_is_malformed() {
        let result = SecretCipher::new("k").decrypt(&BASE64.encode([0u8; 8]));
        assert!(matches!(result, Err(CipherError::Malformed(_))));
    }

    #[test]
    fn non_base64_blob_is_malformed() {
        let result = SecretCipher::new("k").decrypt("not base64 at all!!!");
        assert!(matches!(result, Err(CipherError::Malformed(_))));
    }

    #[test]
    fn tampered_tag_fails_closed() {
        let cipher = SecretCipher::new("my secret phrase");
        let blob = cipher.encrypt("payload under test").expect("encrypt");

        let mut raw = BASE64.decode(&blob).expect("valid base64");
        let last = raw.len() - 1;
        raw[last] ^= 0x01;

        let result = cipher.decrypt(&BASE64.encode(raw));
        assert_eq!(result, Err(CipherError::AuthenticationFailed));
    }
}
