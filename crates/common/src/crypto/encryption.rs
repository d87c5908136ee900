//! AES-256-GCM sealing of provider refresh tokens.
//!
//! The key is derived from a process secret with SHA-256, so any non-empty
//! secret yields a valid 256-bit key. Sealed values are encoded as
//!
//! ```text
//! base64( nonce[12] || ciphertext || tag[16] )
//! ```
//!
//! with a fresh random nonce per call, so sealing the same plaintext twice
//! produces different outputs.
//!
//! ## Usage
//!
//! ```rust
//! use authbridge_common::crypto::TokenCipher;
//!
//! let cipher = TokenCipher::from_secret("process-secret")?;
//! let sealed = cipher.encrypt_to_string("refresh-token")?;
//! assert_eq!(cipher.decrypt_from_string(&sealed)?, "refresh-token");
//! # Ok::<(), authbridge_common::crypto::CryptoError>(())
//! ```

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};
use thiserror::Error;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Errors raised while sealing or opening a token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("encryption secret must not be empty")]
    InvalidKey,

    #[error("encryption failed")]
    EncryptFailed,

    #[error("sealed value is not valid base64: {0}")]
    Encoding(String),

    #[error("sealed value is too short ({0} bytes)")]
    Truncated(usize),

    /// Authentication tag mismatch: wrong key, or the ciphertext was altered.
    #[error("sealed value failed authentication")]
    Tampered,

    #[error("decrypted value is not valid UTF-8")]
    InvalidUtf8,
}

/// Symmetric cipher for values persisted at rest.
#[derive(Clone)]
pub struct TokenCipher {
    cipher: Aes256Gcm,
    fingerprint: String,
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCipher")
            .field("key", &"[REDACTED]")
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

impl TokenCipher {
    /// Derive the cipher key as `SHA-256(secret)`.
    ///
    /// # Errors
    /// Returns [`CryptoError::InvalidKey`] for an empty secret.
    pub fn from_secret(secret: &str) -> Result<Self, CryptoError> {
        if secret.is_empty() {
            return Err(CryptoError::InvalidKey);
        }

        let key = Sha256::digest(secret.as_bytes());
        let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CryptoError::InvalidKey)?;

        let fingerprint = BASE64.encode(&Sha256::digest(key)[..8]);

        Ok(Self { cipher, fingerprint })
    }

    /// Seal raw bytes into `nonce || ciphertext`.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext =
            self.cipher.encrypt(&nonce, plaintext).map_err(|_| CryptoError::EncryptFailed)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Open a value produced by [`TokenCipher::seal`].
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::Truncated(sealed.len()));
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CryptoError::Tampered)
    }

    /// Seal a string and encode it as standard base64.
    pub fn encrypt_to_string(&self, plaintext: &str) -> Result<String, CryptoError> {
        Ok(BASE64.encode(self.seal(plaintext.as_bytes())?))
    }

    /// Decode and open a value produced by
    /// [`TokenCipher::encrypt_to_string`].
    pub fn decrypt_from_string(&self, encoded: &str) -> Result<String, CryptoError> {
        let sealed = BASE64.decode(encoded).map_err(|e| CryptoError::Encoding(e.to_string()))?;
        let plaintext = self.open(&sealed)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidUtf8)
    }

    /// Short, non-reversible identifier of the derived key, safe to log.
    #[must_use]
    pub fn key_fingerprint(&self) -> &str {
        &self.fingerprint
    }
}
