//! # Inbound Port - AnchorSubmitterApi
//!
//! Driven by the runtime scheduler or an on-demand trigger. Concurrent runs
//! are safe: the queue's exclusive claim is the only coordination needed.

use crate::domain::{RunReport, SubmitterError};
use async_trait::async_trait;
use ic_01_anchor_queue::AnchorStatus;
use shared_types::EntryId;
use std::time::Duration;

/// Primary API of the anchor submitter.
#[async_trait]
pub trait AnchorSubmitterApi: Send + Sync {
    /// Claims up to `batch_size` entries and drives each to a terminal or
    /// retry state.
    async fn run(&self, batch_size: usize) -> Result<RunReport, SubmitterError>;

    /// Like `run`, but stops waiting after `deadline`. Entries not finished by
    /// then stay `Processing` until the stall sweep reclaims them.
    async fn run_with_timeout(
        &self,
        batch_size: usize,
        deadline: Duration,
    ) -> Result<RunReport, SubmitterError>;

    /// Reclaims entries stuck in `Processing` past the stall timeout.
    async fn sweep_stalled(&self) -> Result<Vec<(EntryId, AnchorStatus)>, SubmitterError>;
}
