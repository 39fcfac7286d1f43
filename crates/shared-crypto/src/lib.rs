//! # Shared Crypto - Integrity Primitives
//!
//! **Status:** Production-Ready
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `canonical` | Length-prefixed schema encoding | Hash input |
//! | `hashing` | SHA-256, BLAKE3 KDF | `HashEngine`, key derivation |
//! | `symmetric` | AES-256-GCM | Payload and key wrapping |
//! | `kem` | ML-KEM-768 | Post-quantum key encapsulation |
//! | `hybrid` | KEM + AES-256-GCM | `HybridCipher` |
//!
//! ## Security Properties
//!
//! - **HashEngine**: pure, cross-implementation stable digests
//! - **HybridCipher**: fresh data key and IV per call, authenticated payload
//!   and authenticated key wrap; keys zeroized on drop, never logged

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod canonical;
pub mod errors;
pub mod hashing;
pub mod hybrid;
pub mod kem;
pub mod symmetric;

// Re-exports
pub use canonical::{
    AuditExportFields, CanonicalField, CanonicalSubject, CanonicalValue, ConsentFields,
    RecordFields, RevocationFields, SubjectType, CANONICAL_VERSION,
};
pub use errors::{CryptoError, DecryptionError};
pub use hashing::{blake3_derive_key, sha256, ContentHash, HashEngine};
pub use hybrid::{AlgorithmId, EncryptedPayload, HybridCipher};
pub use kem::{
    KeyEncapsulation, MlKem768Kem, RecipientKeyPair, RecipientPrivateKey, RecipientPublicKey,
};
pub use symmetric::{Iv, SecretKey};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
