//! # HashEngine
//!
//! Deterministic SHA-256 content hashing over canonical subjects.
//!
//! The digest is the unit of blockchain anchoring and legal tamper-evidence:
//! identical canonical input must produce identical bytes in every process
//! and every language. See [`crate::canonical`] for the encoding.

use crate::canonical::{self, CanonicalField, CanonicalSubject, SubjectType, CANONICAL_VERSION};
use crate::CryptoError;
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use sha2::{Digest, Sha256};
use shared_types::Hash;

/// A content digest plus the canonical rule that produced it.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash {
    /// SHA-256 of the canonical encoding.
    #[serde_as(as = "Hex")]
    digest: Hash,
    /// Subject type whose schema fixed the field order.
    subject_type: SubjectType,
    /// Canonical encoding version.
    version: u8,
}

impl ContentHash {
    /// Wraps an existing digest.
    pub fn from_digest(subject_type: SubjectType, digest: Hash) -> Self {
        Self {
            digest,
            subject_type,
            version: CANONICAL_VERSION,
        }
    }

    /// Parses a 64-character hex digest.
    ///
    /// # Errors
    ///
    /// `CryptoError::InvalidEncoding` on bad hex or wrong length.
    pub fn from_hex(subject_type: SubjectType, hex_digest: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(hex_digest).map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
        let digest: Hash = bytes.try_into().map_err(|b: Vec<u8>| {
            CryptoError::InvalidEncoding(format!("digest must be 32 bytes, got {}", b.len()))
        })?;
        Ok(Self::from_digest(subject_type, digest))
    }

    /// Raw digest bytes.
    pub fn digest(&self) -> &Hash {
        &self.digest
    }

    /// Subject type.
    pub fn subject_type(&self) -> SubjectType {
        self.subject_type
    }

    /// Canonical encoding version.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Lowercase hex digest, the form submitted to the ledger.
    pub fn to_hex(&self) -> String {
        hex::encode(self.digest)
    }

    /// First 8 hex characters, for logs.
    pub fn short(&self) -> String {
        hex::encode(&self.digest[..4])
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.subject_type, self.to_hex())
    }
}

/// Stateless content hasher.
#[derive(Clone, Copy, Debug, Default)]
pub struct HashEngine;

impl HashEngine {
    /// Hashes an explicit ordered field list for `subject_type`.
    ///
    /// # Errors
    ///
    /// `CryptoError::MalformedCanonicalInput` if the fields do not match the
    /// subject schema exactly in order.
    pub fn digest(
        subject_type: SubjectType,
        fields: &[CanonicalField<'_>],
    ) -> Result<ContentHash, CryptoError> {
        let bytes = canonical::encode(subject_type, fields)?;
        Ok(ContentHash::from_digest(subject_type, sha256(&bytes)))
    }

    /// Hashes a typed subject.
    ///
    /// # Errors
    ///
    /// `CryptoError::FieldTooLarge` if a field does not fit the u32 prefix.
    pub fn digest_subject(subject: &CanonicalSubject) -> Result<ContentHash, CryptoError> {
        let bytes = subject.to_canonical_bytes()?;
        Ok(ContentHash::from_digest(subject.subject_type(), sha256(&bytes)))
    }

    /// Hashes a serialized audit export artifact.
    pub fn digest_audit_export(content: &[u8]) -> Result<ContentHash, CryptoError> {
        Self::digest_subject(&CanonicalSubject::AuditExport(
            canonical::AuditExportFields {
                content: content.to_vec(),
            },
        ))
    }

    /// Recomputes the hash of `subject` and compares it with `expected`.
    ///
    /// A subject that cannot be encoded never verifies.
    pub fn verify(subject: &CanonicalSubject, expected: &ContentHash) -> bool {
        matches!(Self::digest_subject(subject), Ok(hash) if hash == *expected)
    }
}

/// SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Hash {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

/// Derive key from context and input key material (BLAKE3 KDF mode).
pub fn blake3_derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(key_material);
    *hasher.finalize().as_bytes()
}
