//! Submitter and ledger error types.

use ic_01_anchor_queue::AnchorQueueError;
use thiserror::Error;

/// Failure reported by the external ledger connector.
///
/// All variants are treated as transient by the submitter: the entry goes
/// through `fail` and is retried until the attempt cap.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The call did not finish in time.
    #[error("ledger timeout: {0}")]
    Timeout(String),
    /// Transport failure.
    #[error("ledger network error: {0}")]
    Network(String),
    /// The ledger refused the submission.
    #[error("ledger rejected submission: {0}")]
    Rejected(String),
}

/// Anchor submitter error type.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SubmitterError {
    /// Queue operation failed.
    #[error("anchor queue error: {0}")]
    Queue(#[from] AnchorQueueError),
}
