//! # Symmetric Encryption
//!
//! AES-256-GCM with 96-bit random IVs and 128-bit tags.
//!
//! ## Security Properties
//!
//! - Authenticated: any ciphertext, IV or associated-data change fails the tag
//! - Keys are zeroized on drop and never cloned into logs

use crate::{CryptoError, DecryptionError};
use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use zeroize::Zeroize;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// AES-GCM IV length in bytes.
pub const IV_LEN: usize = 12;

/// AES-GCM tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Secret key (256-bit).
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretKey([u8; KEY_LEN]);

impl SecretKey {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice.
    ///
    /// # Errors
    ///
    /// `CryptoError::InvalidKeyLength` unless the slice is 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != KEY_LEN {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_LEN,
                actual: bytes.len(),
            });
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Generate random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// AES-GCM initialization vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Iv([u8; IV_LEN]);

impl Iv {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; IV_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice.
    ///
    /// # Errors
    ///
    /// `DecryptionError::MalformedPayload` unless the slice is 12 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DecryptionError> {
        let iv: [u8; IV_LEN] = bytes.try_into().map_err(|_| {
            DecryptionError::MalformedPayload(format!(
                "iv must be {IV_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(iv))
    }

    /// Generate a random IV.
    pub fn generate() -> Self {
        let mut bytes = [0u8; IV_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; IV_LEN] {
        &self.0
    }
}

/// Encrypt `plaintext` under `key`/`iv`, binding `aad`.
///
/// Returns ciphertext with the 16-byte tag appended.
///
/// # Errors
///
/// Returns `CryptoError::EncryptionFailed` if encryption fails.
pub fn seal(key: &SecretKey, iv: &Iv, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    cipher
        .encrypt(
            Nonce::from_slice(iv.as_bytes()),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
}

/// Decrypt and authenticate `ciphertext`.
///
/// # Errors
///
/// `DecryptionError::AuthenticationFailed` on any tag mismatch (wrong key,
/// tampered ciphertext, IV or associated data).
pub fn open(
    key: &SecretKey,
    iv: &Iv,
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, DecryptionError> {
    if ciphertext.len() < TAG_LEN {
        return Err(DecryptionError::MalformedPayload(format!(
            "ciphertext shorter than the {TAG_LEN}-byte tag"
        )));
    }
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    cipher
        .decrypt(
            Nonce::from_slice(iv.as_bytes()),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| DecryptionError::AuthenticationFailed)
}
