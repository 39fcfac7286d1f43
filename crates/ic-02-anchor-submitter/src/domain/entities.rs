//! Submitter configuration and run accounting.

use serde::{Deserialize, Serialize};

/// Anchor submitter configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitterConfig {
    /// Upper bound for one ledger `submit` call (milliseconds).
    pub submit_timeout_ms: u64,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            submit_timeout_ms: 10_000,
        }
    }
}

/// What happened to one claimed entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Submitted and anchored.
    Anchored,
    /// Resolved to an existing anchor without a ledger call.
    Deduplicated,
    /// Submission failed; back to pending.
    Retried,
    /// Submission failed; dead-lettered.
    Failed,
    /// A queue operation failed; the entry stays processing for the stall sweep.
    Unresolved,
}

/// Summary of one submitter run.
///
/// Returned instead of pushing notifications; the caller decides how to
/// surface it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Entries claimed from the queue.
    pub claimed: usize,
    /// Ledger `submit` calls made.
    pub submitted: usize,
    /// Entries anchored through a ledger call.
    pub anchored: usize,
    /// Entries resolved to an existing anchor.
    pub deduplicated: usize,
    /// Entries returned to pending.
    pub retried: usize,
    /// Entries dead-lettered.
    pub failed: usize,
    /// Entries left processing (deadline hit or queue error).
    pub unfinished: usize,
}

impl RunReport {
    pub(crate) fn record(&mut self, outcome: EntryOutcome) {
        match outcome {
            EntryOutcome::Anchored => self.anchored += 1,
            EntryOutcome::Deduplicated => self.deduplicated += 1,
            EntryOutcome::Retried => self.retried += 1,
            EntryOutcome::Failed => self.failed += 1,
            EntryOutcome::Unresolved => self.unfinished += 1,
        }
    }

    /// Returns true if nothing was claimed.
    pub fn is_idle(&self) -> bool {
        self.claimed == 0
    }
}
