//! # Hybrid Encryption
//!
//! AES-256-GCM payload encryption with the per-payload data key wrapped to
//! the recipient through a post-quantum KEM.
//!
//! ```text
//! data_key ──AES-256-GCM(iv, aad=algorithmId)──→ ciphertext
//!
//! KEM.encapsulate(recipient_pk) → (kem_ct, shared)
//! kek = BLAKE3-KDF(shared ‖ kem_ct)
//! wrappedKey = kem_ct ‖ wrap_iv ‖ AES-256-GCM(kek, wrap_iv, data_key)
//! ```
//!
//! The data key and KEK live only on the stack of `encrypt`/`decrypt` and
//! are zeroized on drop.

use crate::hashing::blake3_derive_key;
use crate::kem::{
    KeyEncapsulation, MlKem768Kem, RecipientKeyPair, RecipientPrivateKey, RecipientPublicKey,
};
use crate::symmetric::{self, Iv, SecretKey, IV_LEN, KEY_LEN, TAG_LEN};
use crate::{CryptoError, DecryptionError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use shared_types::Timestamp;
use std::sync::Arc;
use zeroize::Zeroizing;

const KEK_CONTEXT: &str = "integrity-core 2024 hybrid key-wrap v1";
const WRAP_AAD: &[u8] = b"integrity-core/wrapped-data-key";
const WRAPPED_DATA_KEY_LEN: usize = KEY_LEN + TAG_LEN;

/// Self-describing algorithm identifier carried in every payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlgorithmId {
    /// ML-KEM-768 key wrapping, AES-256-GCM payload.
    MlKem768Aes256Gcm,
    /// An identifier this build does not know how to decrypt.
    Unknown(String),
}

impl AlgorithmId {
    /// Wire string.
    pub fn as_str(&self) -> &str {
        match self {
            AlgorithmId::MlKem768Aes256Gcm => "ML-KEM-768+AES-256-GCM",
            AlgorithmId::Unknown(id) => id,
        }
    }
}

impl From<String> for AlgorithmId {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ML-KEM-768+AES-256-GCM" => AlgorithmId::MlKem768Aes256Gcm,
            _ => AlgorithmId::Unknown(value),
        }
    }
}

impl From<AlgorithmId> for String {
    fn from(value: AlgorithmId) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hybrid-encrypted payload (wire format).
///
/// Binary fields are hex-encoded in JSON; keys are camelCase.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedPayload {
    /// AES-GCM ciphertext with appended tag.
    #[serde_as(as = "Hex")]
    pub ciphertext: Vec<u8>,
    /// 96-bit AES-GCM IV.
    #[serde_as(as = "Hex")]
    pub iv: Vec<u8>,
    /// KEM ciphertext, wrap IV and wrapped data key.
    #[serde_as(as = "Hex")]
    pub wrapped_key: Vec<u8>,
    /// Algorithm suite.
    pub algorithm_id: AlgorithmId,
    /// Encryption time.
    pub created_at: Timestamp,
}

impl EncryptedPayload {
    /// Serialize to the JSON wire format.
    ///
    /// # Errors
    ///
    /// `CryptoError::InvalidEncoding` if serialization fails.
    pub fn to_json(&self) -> Result<String, CryptoError> {
        serde_json::to_string(self).map_err(|e| CryptoError::InvalidEncoding(e.to_string()))
    }

    /// Parse the JSON wire format.
    ///
    /// # Errors
    ///
    /// `CryptoError::InvalidEncoding` on malformed JSON or hex.
    pub fn from_json(json: &str) -> Result<Self, CryptoError> {
        serde_json::from_str(json).map_err(|e| CryptoError::InvalidEncoding(e.to_string()))
    }
}

/// Hybrid cipher bound to one KEM.
///
/// Stateless apart from the KEM handle; safe to share across threads.
#[derive(Clone)]
pub struct HybridCipher {
    kem: Arc<dyn KeyEncapsulation>,
    algorithm: AlgorithmId,
}

impl Default for HybridCipher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HybridCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridCipher")
            .field("kem", &self.kem.name())
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl HybridCipher {
    /// ML-KEM-768 + AES-256-GCM.
    pub fn new() -> Self {
        Self {
            kem: Arc::new(MlKem768Kem),
            algorithm: AlgorithmId::MlKem768Aes256Gcm,
        }
    }

    /// Algorithm suite this cipher produces and accepts.
    pub fn algorithm(&self) -> &AlgorithmId {
        &self.algorithm
    }

    /// Generate a recipient key pair for this cipher's KEM.
    pub fn generate_keypair(&self) -> RecipientKeyPair {
        self.kem.generate_keypair()
    }

    fn wrapped_key_len(&self) -> usize {
        self.kem.ciphertext_len() + IV_LEN + WRAPPED_DATA_KEY_LEN
    }

    /// Encrypt `plaintext` for the holder of `recipient`.
    ///
    /// # Errors
    ///
    /// `CryptoError::InvalidPublicKey` for an undecodable key, or
    /// `EncryptionFailed`.
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        recipient: &RecipientPublicKey,
    ) -> Result<EncryptedPayload, CryptoError> {
        let data_key = SecretKey::generate();
        let iv = Iv::generate();
        let ciphertext =
            symmetric::seal(&data_key, &iv, plaintext, self.algorithm.as_str().as_bytes())?;

        let (kem_ciphertext, shared) = self.kem.encapsulate(recipient)?;
        let kek = derive_kek(&shared, &kem_ciphertext);
        let wrap_iv = Iv::generate();
        let wrapped_data_key = symmetric::seal(&kek, &wrap_iv, data_key.as_bytes(), WRAP_AAD)?;

        let mut wrapped_key = Vec::with_capacity(self.wrapped_key_len());
        wrapped_key.extend_from_slice(&kem_ciphertext);
        wrapped_key.extend_from_slice(wrap_iv.as_bytes());
        wrapped_key.extend_from_slice(&wrapped_data_key);

        Ok(EncryptedPayload {
            ciphertext,
            iv: iv.as_bytes().to_vec(),
            wrapped_key,
            algorithm_id: self.algorithm.clone(),
            created_at: Utc::now(),
        })
    }

    /// Decrypt a payload with the recipient's private key.
    ///
    /// # Errors
    ///
    /// Any `DecryptionError`; all are fatal for this payload.
    pub fn decrypt(
        &self,
        payload: &EncryptedPayload,
        recipient: &RecipientPrivateKey,
    ) -> Result<Vec<u8>, DecryptionError> {
        if payload.algorithm_id != self.algorithm {
            return Err(DecryptionError::UnsupportedAlgorithm(
                payload.algorithm_id.to_string(),
            ));
        }
        if payload.wrapped_key.len() != self.wrapped_key_len() {
            return Err(DecryptionError::MalformedPayload(format!(
                "wrappedKey must be {} bytes, got {}",
                self.wrapped_key_len(),
                payload.wrapped_key.len()
            )));
        }
        let iv = Iv::from_slice(&payload.iv)?;

        let (kem_ciphertext, rest) = payload.wrapped_key.split_at(self.kem.ciphertext_len());
        let (wrap_iv, wrapped_data_key) = rest.split_at(IV_LEN);

        let shared = self.kem.decapsulate(recipient, kem_ciphertext)?;
        let kek = derive_kek(&shared, kem_ciphertext);
        let data_key_bytes = Zeroizing::new(
            symmetric::open(&kek, &Iv::from_slice(wrap_iv)?, wrapped_data_key, WRAP_AAD)
                .map_err(|_| DecryptionError::KeyUnwrapFailed)?,
        );
        let data_key = SecretKey::from_slice(&data_key_bytes)
            .map_err(|e| DecryptionError::MalformedPayload(e.to_string()))?;

        symmetric::open(
            &data_key,
            &iv,
            &payload.ciphertext,
            self.algorithm.as_str().as_bytes(),
        )
    }
}

fn derive_kek(shared: &[u8; 32], kem_ciphertext: &[u8]) -> SecretKey {
    let mut material = Zeroizing::new(Vec::with_capacity(32 + kem_ciphertext.len()));
    material.extend_from_slice(shared);
    material.extend_from_slice(kem_ciphertext);
    SecretKey::from_bytes(blake3_derive_key(KEK_CONTEXT, &material))
}
