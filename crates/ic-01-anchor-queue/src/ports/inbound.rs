//! # Inbound Port - AnchorQueueApi
//!
//! | Method | Caller |
//! |--------|--------|
//! | `enqueue` | hashing call sites (records, consents, revocations, exports) |
//! | `claim_batch` / `complete` / `fail` | Anchor Submitter |
//! | `reclaim_stalled` | scheduler stall sweep |
//! | `dead_letters` / `requeue_dead_letter` | operators |

use crate::domain::{
    AnchorQueueEntry, AnchorQueueError, AnchorRecord, AnchorStatus, ClaimToken, EnqueueOutcome,
    QueueStatus,
};
use shared_crypto::ContentHash;
use shared_types::{EntryId, SubjectId};

/// Primary API of the anchor queue.
///
/// # Example
///
/// ```rust,ignore
/// let outcome = queue.enqueue(&hash, SubjectId::new("rec-1"))?;
/// for entry in queue.claim_batch(10)? {
///     match ledger.submit(&entry.hash.to_hex()).await {
///         Ok(tx) => { queue.complete(&entry.claim_token(), &tx, "mock")?; }
///         Err(e) => { queue.fail(&entry.claim_token(), &e.to_string())?; }
///     }
/// }
/// ```
pub trait AnchorQueueApi: Send + Sync {
    /// Records a hash for anchoring.
    ///
    /// Short-circuits to an anchored entry when the hash already has an
    /// `AnchorRecord`.
    fn enqueue(
        &self,
        hash: &ContentHash,
        subject_id: SubjectId,
    ) -> Result<EnqueueOutcome, AnchorQueueError>;

    /// Atomically moves up to `max` oldest pending entries to processing.
    ///
    /// Concurrent callers never receive the same entry, and at most one entry
    /// per hash is processing at any time.
    fn claim_batch(&self, max: usize) -> Result<Vec<AnchorQueueEntry>, AnchorQueueError>;

    /// Resolves a processing entry to the (unique) anchor of its hash.
    ///
    /// If the hash already has an anchor, the entry attaches to it and the
    /// given transaction id is ignored.
    ///
    /// # Errors
    /// - `StaleClaim`: the entry was reclaimed since `claim` was issued
    fn complete(
        &self,
        claim: &ClaimToken,
        external_tx_id: &str,
        network: &str,
    ) -> Result<AnchorRecord, AnchorQueueError>;

    /// Records a failed attempt under `claim`. Returns the resulting status.
    ///
    /// # Errors
    /// - `StaleClaim`: the entry was reclaimed since `claim` was issued
    fn fail(&self, claim: &ClaimToken, error: &str) -> Result<AnchorStatus, AnchorQueueError>;

    /// Looks up an entry.
    fn get_entry(&self, entry_id: &EntryId) -> Result<Option<AnchorQueueEntry>, AnchorQueueError>;

    /// Looks up the anchor for a hash.
    fn find_anchor(&self, hash: &ContentHash) -> Result<Option<AnchorRecord>, AnchorQueueError>;

    /// Entries in the `Failed` state.
    fn dead_letters(&self) -> Result<Vec<AnchorQueueEntry>, AnchorQueueError>;

    /// Operator requeue of a dead-lettered entry with a fresh retry budget.
    fn requeue_dead_letter(&self, entry_id: &EntryId) -> Result<(), AnchorQueueError>;

    /// Fails every processing entry claimed longer ago than the stall timeout.
    ///
    /// Returns the reclaimed entries with their resulting status.
    fn reclaim_stalled(&self) -> Result<Vec<(EntryId, AnchorStatus)>, AnchorQueueError>;

    /// Counters by state.
    fn status(&self) -> Result<QueueStatus, AnchorQueueError>;
}
