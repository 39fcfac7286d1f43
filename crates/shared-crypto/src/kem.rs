//! # Key Encapsulation
//!
//! Post-quantum KEM port used to wrap per-payload data keys for a recipient.
//! The default implementation is ML-KEM-768 (FIPS 203).

use crate::{CryptoError, DecryptionError};
use ml_kem::kem::{Decapsulate, Encapsulate};
use ml_kem::{Ciphertext, Encoded, EncodedSizeUser, KemCore, MlKem768};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use zeroize::Zeroizing;

type MlKem768EncapsulationKey = <MlKem768 as KemCore>::EncapsulationKey;
type MlKem768DecapsulationKey = <MlKem768 as KemCore>::DecapsulationKey;

/// ML-KEM-768 encapsulation key length.
pub const ML_KEM_768_PUBLIC_KEY_LEN: usize = 1184;

/// ML-KEM-768 decapsulation key length.
pub const ML_KEM_768_PRIVATE_KEY_LEN: usize = 2400;

/// ML-KEM-768 ciphertext length.
pub const ML_KEM_768_CIPHERTEXT_LEN: usize = 1088;

/// 32-byte KEM shared secret, zeroized on drop.
pub type SharedSecret = Zeroizing<[u8; 32]>;

/// Recipient public (encapsulation) key.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientPublicKey(#[serde_as(as = "Hex")] Vec<u8>);

impl RecipientPublicKey {
    /// Wraps encoded key bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Encoded key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Recipient private (decapsulation) key. Zeroized on drop.
#[derive(Clone)]
pub struct RecipientPrivateKey(Zeroizing<Vec<u8>>);

impl RecipientPrivateKey {
    /// Wraps encoded key bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Encoded key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for RecipientPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RecipientPrivateKey(<redacted>)")
    }
}

/// A recipient key pair.
#[derive(Clone, Debug)]
pub struct RecipientKeyPair {
    /// Public half, distributed to encrypting parties.
    pub public: RecipientPublicKey,
    /// Private half, held by the recipient only.
    pub private: RecipientPrivateKey,
}

/// Key-encapsulation mechanism port.
pub trait KeyEncapsulation: Send + Sync {
    /// Algorithm name, e.g. `ML-KEM-768`.
    fn name(&self) -> &'static str;

    /// Length of an encapsulation ciphertext.
    fn ciphertext_len(&self) -> usize;

    /// Generate a fresh recipient key pair.
    fn generate_keypair(&self) -> RecipientKeyPair;

    /// Encapsulate a fresh shared secret to `public_key`.
    ///
    /// # Errors
    ///
    /// `CryptoError::InvalidPublicKey` if the key cannot be decoded.
    fn encapsulate(
        &self,
        public_key: &RecipientPublicKey,
    ) -> Result<(Vec<u8>, SharedSecret), CryptoError>;

    /// Recover the shared secret from `ciphertext`.
    ///
    /// # Errors
    ///
    /// `DecryptionError::InvalidPrivateKey` or `MalformedPayload` on bad
    /// input lengths.
    fn decapsulate(
        &self,
        private_key: &RecipientPrivateKey,
        ciphertext: &[u8],
    ) -> Result<SharedSecret, DecryptionError>;
}

/// ML-KEM-768 implementation.
///
/// Decapsulation uses implicit rejection: a tampered ciphertext yields an
/// unrelated shared secret, so tampering surfaces when the wrapped key fails
/// to authenticate.
#[derive(Clone, Copy, Debug, Default)]
pub struct MlKem768Kem;

impl KeyEncapsulation for MlKem768Kem {
    fn name(&self) -> &'static str {
        "ML-KEM-768"
    }

    fn ciphertext_len(&self) -> usize {
        ML_KEM_768_CIPHERTEXT_LEN
    }

    fn generate_keypair(&self) -> RecipientKeyPair {
        let (dk, ek) = MlKem768::generate(&mut OsRng);
        RecipientKeyPair {
            public: RecipientPublicKey::from_bytes(ek.as_bytes().to_vec()),
            private: RecipientPrivateKey::from_bytes(dk.as_bytes().to_vec()),
        }
    }

    fn encapsulate(
        &self,
        public_key: &RecipientPublicKey,
    ) -> Result<(Vec<u8>, SharedSecret), CryptoError> {
        if public_key.as_bytes().len() != ML_KEM_768_PUBLIC_KEY_LEN {
            return Err(CryptoError::InvalidPublicKey);
        }
        let encoded = Encoded::<MlKem768EncapsulationKey>::try_from(public_key.as_bytes())
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        let ek = MlKem768EncapsulationKey::from_bytes(&encoded);
        let (ciphertext, shared) = ek
            .encapsulate(&mut OsRng)
            .map_err(|_| CryptoError::EncapsulationFailed(self.name().to_string()))?;

        let mut secret = Zeroizing::new([0u8; 32]);
        secret.copy_from_slice(&shared[..]);
        Ok((ciphertext.to_vec(), secret))
    }

    fn decapsulate(
        &self,
        private_key: &RecipientPrivateKey,
        ciphertext: &[u8],
    ) -> Result<SharedSecret, DecryptionError> {
        if private_key.as_bytes().len() != ML_KEM_768_PRIVATE_KEY_LEN {
            return Err(DecryptionError::InvalidPrivateKey);
        }
        if ciphertext.len() != ML_KEM_768_CIPHERTEXT_LEN {
            return Err(DecryptionError::MalformedPayload(format!(
                "kem ciphertext must be {ML_KEM_768_CIPHERTEXT_LEN} bytes, got {}",
                ciphertext.len()
            )));
        }
        let encoded = Encoded::<MlKem768DecapsulationKey>::try_from(private_key.as_bytes())
            .map_err(|_| DecryptionError::InvalidPrivateKey)?;
        let dk = MlKem768DecapsulationKey::from_bytes(&encoded);
        let ct = Ciphertext::<MlKem768>::try_from(ciphertext)
            .map_err(|_| DecryptionError::MalformedPayload("kem ciphertext".into()))?;
        let shared = dk
            .decapsulate(&ct)
            .map_err(|_| DecryptionError::DecapsulationFailed)?;

        let mut secret = Zeroizing::new([0u8; 32]);
        secret.copy_from_slice(&shared[..]);
        Ok(secret)
    }
}
