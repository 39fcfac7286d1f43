//! Value objects returned by the anchor queue.

use super::entities::AnchorRecord;
use serde::{Deserialize, Serialize};
use shared_types::EntryId;

/// Result of `enqueue`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// A new pending entry was created.
    Queued(EntryId),
    /// The hash was already anchored; the entry was recorded as anchored.
    AlreadyAnchored {
        /// The new (already resolved) entry.
        entry_id: EntryId,
        /// The existing anchor.
        anchor: AnchorRecord,
    },
}

impl EnqueueOutcome {
    /// Entry id created by the enqueue.
    pub fn entry_id(&self) -> EntryId {
        match self {
            EnqueueOutcome::Queued(id) => *id,
            EnqueueOutcome::AlreadyAnchored { entry_id, .. } => *entry_id,
        }
    }
}

/// Identifies one claim of a queue entry.
///
/// `complete` and `fail` only act while the entry is still processing under
/// the same claim, so a submitter whose claim was reclaimed cannot move it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimToken {
    /// Claimed entry.
    pub entry_id: EntryId,
    /// Claim sequence number at claim time.
    pub seq: u64,
}

/// Queue counters by state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Entries awaiting a claim.
    pub pending: usize,
    /// Entries held by a submitter.
    pub processing: usize,
    /// Entries resolved to an anchor.
    pub anchored: usize,
    /// Dead-lettered entries.
    pub failed: usize,
    /// Distinct anchor records.
    pub anchors: usize,
}

impl QueueStatus {
    /// Total entries ever enqueued.
    pub fn total_entries(&self) -> usize {
        self.pending + self.processing + self.anchored + self.failed
    }
}
