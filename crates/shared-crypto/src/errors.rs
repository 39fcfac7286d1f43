//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed
    #[error("Decryption failed: {0}")]
    Decryption(#[from] DecryptionError),

    /// Invalid key length
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length in bytes
        expected: usize,
        /// Actual key length in bytes
        actual: usize,
    },

    /// Invalid public key
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// KEM encapsulation failed
    #[error("Key encapsulation failed: {0}")]
    EncapsulationFailed(String),

    /// Canonical field list does not match the subject schema
    #[error("Malformed canonical input for {subject}: {reason}")]
    MalformedCanonicalInput {
        /// Subject type tag
        subject: &'static str,
        /// What did not match
        reason: String,
    },

    /// A canonical field is longer than its u32 length prefix can express
    #[error("Canonical field of {len} bytes exceeds the u32 length prefix")]
    FieldTooLarge {
        /// Field length in bytes
        len: usize,
    },

    /// Hex or JSON decoding failed
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),
}

/// Reasons a hybrid payload can fail to decrypt.
///
/// Every variant is fatal for the payload it was raised on; retrying with the
/// same inputs always fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecryptionError {
    /// AES-GCM tag mismatch on the payload ciphertext.
    #[error("authentication tag mismatch")]
    AuthenticationFailed,

    /// The wrapped data key could not be unwrapped: wrong private key or a
    /// tampered `wrappedKey`.
    #[error("wrapped key could not be unwrapped (key mismatch or tampering)")]
    KeyUnwrapFailed,

    /// KEM decapsulation rejected the input.
    #[error("key decapsulation failed")]
    DecapsulationFailed,

    /// The recipient private key is not a valid key for the algorithm.
    #[error("invalid private key")]
    InvalidPrivateKey,

    /// Field lengths or structure are invalid.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// `algorithmId` is not one this build can decrypt.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}
