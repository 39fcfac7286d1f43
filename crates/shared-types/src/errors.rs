//! # Error Types
//!
//! Errors raised by store adapters. Every store port in the workspace
//! surfaces this type so subsystems can map it into their own taxonomy.

use thiserror::Error;

/// Errors that can occur in a store adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Row not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness or conditional-update constraint violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Row failed to encode or decode.
    #[error("Codec error: {0}")]
    Codec(String),

    /// Backend operation failed.
    #[error("Database error: {0}")]
    Backend(String),
}
