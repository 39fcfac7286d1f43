//! Consent and revocation error types.

use shared_crypto::CryptoError;
use shared_types::{ConsentId, StoreError};
use thiserror::Error;

/// Consent / revocation error type.
///
/// Every variant except `Hashing` and `Store` is a precondition failure:
/// non-retryable and surfaced to the caller immediately.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RevocationError {
    /// No consent with this id.
    #[error("consent not found: {0}")]
    ConsentNotFound(ConsentId),

    /// The consent was already revoked. Revocation happens exactly once.
    #[error("consent {0} is already revoked")]
    AlreadyRevoked(ConsentId),

    /// Only the consent's subject may revoke it.
    #[error("{revoked_by} is not the subject of consent {consent_id}")]
    Unauthorized {
        /// Consent.
        consent_id: ConsentId,
        /// Rejected revoker.
        revoked_by: String,
    },

    /// Grant request failed validation.
    #[error("invalid consent grant: {0}")]
    InvalidGrant(String),

    /// The consent or event could not be hashed.
    #[error("hashing failed: {0}")]
    Hashing(String),

    /// Persistence failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<CryptoError> for RevocationError {
    fn from(e: CryptoError) -> Self {
        RevocationError::Hashing(e.to_string())
    }
}
