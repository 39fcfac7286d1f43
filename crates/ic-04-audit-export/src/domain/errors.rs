//! Audit export error types.

use shared_crypto::CryptoError;
use shared_types::{StoreError, Timestamp};
use thiserror::Error;

/// Audit export error type.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AuditExportError {
    /// `since` is after `until`.
    #[error("invalid export range: {since} > {until}")]
    InvalidRange {
        /// Range start.
        since: Timestamp,
        /// Range end.
        until: Timestamp,
    },

    /// The export content could not be hashed.
    #[error("hashing failed: {0}")]
    Hashing(String),

    /// Persistence failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<CryptoError> for AuditExportError {
    fn from(e: CryptoError) -> Self {
        AuditExportError::Hashing(e.to_string())
    }
}
