//! Outbound (Driven) ports for the Anchor Queue subsystem.
//!
//! The store owns atomicity: every method that changes an entry's status is a
//! single conditional write, so concurrent submitters in one or many
//! processes cannot double-claim or double-anchor.

use crate::domain::{AnchorQueueEntry, AnchorRecord, AnchorStatus, ClaimToken, QueueStatus};
use shared_types::{EntryId, Hash, StoreError, Timestamp};

/// Durable storage for queue entries and anchor records.
pub trait AnchorStore: Send + Sync {
    /// Inserts a new entry.
    ///
    /// # Errors
    /// - `StoreError::Conflict`: id already present
    fn insert_entry(&self, entry: &AnchorQueueEntry) -> Result<(), StoreError>;

    /// Gets an entry by id.
    fn get_entry(&self, id: &EntryId) -> Result<Option<AnchorQueueEntry>, StoreError>;

    /// Ids of pending entries ordered by `(queued_at, id)`, at most `limit`.
    fn pending_ids_oldest_first(&self, limit: usize) -> Result<Vec<EntryId>, StoreError>;

    /// Conditional `Pending → Processing`.
    ///
    /// Returns `None` when the entry is no longer pending, or when another
    /// entry with the same hash is already processing.
    fn try_claim(&self, id: &EntryId, now: Timestamp) -> Result<Option<AnchorQueueEntry>, StoreError>;

    /// Replaces an entry only if the stored row still has the status and
    /// claim sequence of `expected`.
    ///
    /// Returns `false` when the guard fails.
    fn compare_and_swap(
        &self,
        expected: &AnchorQueueEntry,
        updated: &AnchorQueueEntry,
    ) -> Result<bool, StoreError>;

    /// In one unit: resolves the anchor for the entry's hash (inserting
    /// `candidate` if none exists, otherwise incrementing the existing
    /// record's `subject_count`) and moves the entry `Processing → Anchored`.
    ///
    /// Returns `None` (and writes nothing) unless the entry is still
    /// processing under `claim`.
    fn complete_entry(
        &self,
        claim: &ClaimToken,
        candidate: AnchorRecord,
        now: Timestamp,
    ) -> Result<Option<AnchorRecord>, StoreError>;

    /// Gets the anchor for a digest.
    fn find_anchor_by_hash(&self, hash: &Hash) -> Result<Option<AnchorRecord>, StoreError>;

    /// In one unit: if an anchor exists for the entry's hash, inserts the entry
    /// as anchored to it and increments its `subject_count`; otherwise inserts
    /// the entry unchanged.
    ///
    /// Returns the anchor the entry attached to, if any.
    fn insert_or_attach(&self, entry: &AnchorQueueEntry) -> Result<Option<AnchorRecord>, StoreError>;

    /// All entries in a state, oldest first.
    fn entries_with_status(&self, status: AnchorStatus) -> Result<Vec<AnchorQueueEntry>, StoreError>;

    /// Counters by state.
    fn status_counts(&self) -> Result<QueueStatus, StoreError>;
}
