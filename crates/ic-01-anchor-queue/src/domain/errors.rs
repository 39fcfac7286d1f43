//! Anchor queue error types.

use super::entities::AnchorStatus;
use shared_types::{EntryId, StoreError};
use thiserror::Error;

/// Anchor queue error type.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AnchorQueueError {
    /// No entry with this id.
    #[error("anchor queue entry not found: {0}")]
    EntryNotFound(EntryId),

    /// Operation not allowed from the entry's current state.
    #[error("entry {entry_id}: invalid transition {from} -> {to}")]
    InvalidTransition {
        /// Entry.
        entry_id: EntryId,
        /// Observed status.
        from: AnchorStatus,
        /// Requested status.
        to: AnchorStatus,
    },

    /// The conditional update lost a race with another writer.
    #[error("entry {0} changed concurrently")]
    ConcurrentModification(EntryId),

    /// The claim was reclaimed and possibly handed to another submitter.
    #[error("claim {seq} on entry {entry_id} is no longer current")]
    StaleClaim {
        /// Entry.
        entry_id: EntryId,
        /// Sequence of the presented claim.
        seq: u64,
    },

    /// Persistence failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
