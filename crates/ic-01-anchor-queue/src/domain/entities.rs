//! Core domain entities for the Anchor Queue subsystem.
//!
//! State machine per entry:
//! ```text
//! [PENDING] ──claim──→ [PROCESSING] ──complete──→ [ANCHORED]
//!     ↑                     │
//!     └── fail (attempts < max) / stall sweep
//!                           │
//!                           └── fail (attempts ≥ max) ──→ [FAILED] ──operator requeue──→ [PENDING]
//! ```

use super::errors::AnchorQueueError;
use super::value_objects::ClaimToken;
use serde::{Deserialize, Serialize};
use shared_crypto::{ContentHash, SubjectType};
use shared_types::{new_id, AnchorId, EntryId, SubjectId, Timestamp};

/// Anchoring state of a queue entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorStatus {
    /// Waiting to be claimed by a submitter.
    Pending,
    /// Claimed; a submitter owns it.
    Processing,
    /// Resolved to an `AnchorRecord`.
    Anchored,
    /// Retry budget exhausted; dead-lettered.
    Failed,
}

impl std::fmt::Display for AnchorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AnchorStatus::Pending => "pending",
            AnchorStatus::Processing => "processing",
            AnchorStatus::Anchored => "anchored",
            AnchorStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A content hash awaiting (or done with) ledger submission.
///
/// Never deleted; failed entries are retained for audit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorQueueEntry {
    /// Primary key.
    pub id: EntryId,
    /// Hash to anchor.
    pub hash: ContentHash,
    /// Subject kind, copied from the hash.
    pub subject_type: SubjectType,
    /// Subject the hash was computed for.
    pub subject_id: SubjectId,
    /// Current state.
    pub status: AnchorStatus,
    /// Enqueue time; claim order is oldest first.
    pub queued_at: Timestamp,
    /// Last state change.
    pub updated_at: Timestamp,
    /// Time of the current claim (only while `Processing`).
    pub claimed_at: Option<Timestamp>,
    /// Claims taken so far; every `Pending → Processing` bumps it.
    pub claim_seq: u64,
    /// Failed submission attempts so far.
    pub attempts: u32,
    /// Most recent failure message.
    pub last_error: Option<String>,
    /// Anchor this entry resolved to.
    pub anchor_id: Option<AnchorId>,
}

impl AnchorQueueEntry {
    /// Creates a new pending entry.
    pub fn new(hash: ContentHash, subject_id: SubjectId, now: Timestamp) -> Self {
        Self {
            id: new_id(),
            subject_type: hash.subject_type(),
            hash,
            subject_id,
            status: AnchorStatus::Pending,
            queued_at: now,
            updated_at: now,
            claimed_at: None,
            claim_seq: 0,
            attempts: 0,
            last_error: None,
            anchor_id: None,
        }
    }

    /// Creates an entry already resolved to an existing anchor.
    pub fn already_anchored(
        hash: ContentHash,
        subject_id: SubjectId,
        anchor_id: AnchorId,
        now: Timestamp,
    ) -> Self {
        let mut entry = Self::new(hash, subject_id, now);
        entry.status = AnchorStatus::Anchored;
        entry.anchor_id = Some(anchor_id);
        entry
    }

    /// Returns true if waiting to be claimed.
    pub fn is_pending(&self) -> bool {
        self.status == AnchorStatus::Pending
    }

    /// Returns true if claimed by a submitter.
    pub fn is_processing(&self) -> bool {
        self.status == AnchorStatus::Processing
    }

    /// Returns true if no further automatic transition will occur.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, AnchorStatus::Anchored | AnchorStatus::Failed)
    }

    /// Token of the most recent claim.
    pub fn claim_token(&self) -> ClaimToken {
        ClaimToken {
            entry_id: self.id,
            seq: self.claim_seq,
        }
    }

    /// Returns true if still processing under `claim`.
    pub fn is_claimed_by(&self, claim: &ClaimToken) -> bool {
        self.is_processing() && self.id == claim.entry_id && self.claim_seq == claim.seq
    }

    /// Returns true if `other` has the same status and claim sequence.
    pub fn same_state_as(&self, other: &AnchorQueueEntry) -> bool {
        self.status == other.status && self.claim_seq == other.claim_seq
    }

    fn transition(&self, expected: AnchorStatus, to: AnchorStatus) -> Result<(), AnchorQueueError> {
        if self.status != expected {
            return Err(AnchorQueueError::InvalidTransition {
                entry_id: self.id,
                from: self.status,
                to,
            });
        }
        Ok(())
    }

    /// `Pending → Processing`.
    pub fn claim(&mut self, now: Timestamp) -> Result<(), AnchorQueueError> {
        self.transition(AnchorStatus::Pending, AnchorStatus::Processing)?;
        self.status = AnchorStatus::Processing;
        self.claim_seq = self.claim_seq.wrapping_add(1);
        self.claimed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// `Processing → Anchored`.
    pub fn mark_anchored(&mut self, anchor_id: AnchorId, now: Timestamp) -> Result<(), AnchorQueueError> {
        self.transition(AnchorStatus::Processing, AnchorStatus::Anchored)?;
        self.status = AnchorStatus::Anchored;
        self.anchor_id = Some(anchor_id);
        self.claimed_at = None;
        self.updated_at = now;
        Ok(())
    }

    /// `Processing → Pending` while under the retry cap, else `Processing → Failed`.
    ///
    /// Returns the resulting status.
    pub fn record_failure(
        &mut self,
        error: &str,
        max_attempts: u32,
        now: Timestamp,
    ) -> Result<AnchorStatus, AnchorQueueError> {
        let next = if self.attempts.saturating_add(1) >= max_attempts {
            AnchorStatus::Failed
        } else {
            AnchorStatus::Pending
        };
        self.transition(AnchorStatus::Processing, next)?;
        self.attempts = self.attempts.saturating_add(1);
        self.last_error = Some(error.to_string());
        self.status = next;
        self.claimed_at = None;
        self.updated_at = now;
        Ok(next)
    }

    /// Operator action: `Failed → Pending` with a fresh retry budget.
    ///
    /// `last_error` is kept for the audit trail.
    pub fn requeue(&mut self, now: Timestamp) -> Result<(), AnchorQueueError> {
        self.transition(AnchorStatus::Failed, AnchorStatus::Pending)?;
        self.status = AnchorStatus::Pending;
        self.attempts = 0;
        self.updated_at = now;
        Ok(())
    }

    /// Checks if a processing claim has exceeded `max_age_secs`.
    pub fn is_stalled(&self, now: Timestamp, max_age_secs: u64) -> bool {
        match (self.status, self.claimed_at) {
            (AnchorStatus::Processing, Some(claimed_at)) => {
                let max_age = i64::try_from(max_age_secs).unwrap_or(i64::MAX);
                now.signed_duration_since(claimed_at).num_seconds() >= max_age
            }
            _ => false,
        }
    }
}

/// Confirmed ledger anchor. Exactly one per distinct hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRecord {
    /// Primary key.
    pub id: AnchorId,
    /// Anchored hash (unique).
    pub hash: ContentHash,
    /// Ledger transaction id.
    pub external_tx_id: String,
    /// Ledger network name.
    pub network: String,
    /// Confirmation time.
    pub anchored_at: Timestamp,
    /// Queue entries resolved to this anchor.
    pub subject_count: u32,
}

impl AnchorRecord {
    /// Creates a record for a first confirmation.
    pub fn new(
        hash: ContentHash,
        external_tx_id: impl Into<String>,
        network: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: new_id(),
            hash,
            external_tx_id: external_tx_id.into(),
            network: network.into(),
            anchored_at: now,
            subject_count: 1,
        }
    }
}

/// Anchor queue configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnchorQueueConfig {
    /// Failed attempts after which an entry is dead-lettered.
    pub max_attempts: u32,
    /// Processing claims older than this are reclaimed (seconds).
    pub stall_timeout_secs: u64,
}

impl Default for AnchorQueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            stall_timeout_secs: 300, // 5 minutes
        }
    }
}

impl AnchorQueueConfig {
    /// Creates a minimal config for testing.
    pub fn for_testing() -> Self {
        Self {
            max_attempts: 3,
            stall_timeout_secs: 10,
        }
    }
}
