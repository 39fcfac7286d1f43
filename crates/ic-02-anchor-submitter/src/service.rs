//! Anchor Submitter Service
//!
//! For each claimed entry:
//!
//! ```text
//! existing AnchorRecord? ──yes──→ complete (dedup, no ledger call)
//!         │ no
//!         ↓
//! ledger.submit(hash) ──ok──→ complete
//!         │ err / timeout
//!         ↓
//!       fail ──→ Pending (retry) | Failed (dead letter)
//! ```

use crate::domain::{EntryOutcome, LedgerError, RunReport, SubmitterConfig, SubmitterError};
use crate::ports::{AnchorSubmitterApi, Ledger};
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use ic_01_anchor_queue::{AnchorQueueApi, AnchorQueueEntry, AnchorQueueError, AnchorStatus};
use shared_types::EntryId;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Anchor submitter implementation.
pub struct AnchorSubmitter {
    config: SubmitterConfig,
    queue: Arc<dyn AnchorQueueApi>,
    ledger: Arc<dyn Ledger>,
}

impl AnchorSubmitter {
    /// Creates a submitter.
    pub fn new(
        config: SubmitterConfig,
        queue: Arc<dyn AnchorQueueApi>,
        ledger: Arc<dyn Ledger>,
    ) -> Self {
        Self {
            config,
            queue,
            ledger,
        }
    }

    /// Network the submitter anchors to.
    pub fn network(&self) -> &str {
        self.ledger.network()
    }

    async fn submit(&self, hash_hex: &str) -> Result<String, LedgerError> {
        let limit = Duration::from_millis(self.config.submit_timeout_ms);
        match tokio::time::timeout(limit, self.ledger.submit(hash_hex)).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::Timeout(format!(
                "no response within {}ms",
                self.config.submit_timeout_ms
            ))),
        }
    }

    /// Drives one claimed entry. Returns whether the ledger was called.
    async fn process(&self, entry: AnchorQueueEntry) -> (EntryOutcome, bool) {
        let claim = entry.claim_token();
        match self.queue.find_anchor(&entry.hash) {
            Ok(Some(anchor)) => {
                let outcome =
                    match self
                        .queue
                        .complete(&claim, &anchor.external_tx_id, &anchor.network)
                    {
                        Ok(_) => {
                            debug!(
                                "[ic-02] {} deduplicated onto tx {}",
                                entry.hash.short(),
                                anchor.external_tx_id
                            );
                            EntryOutcome::Deduplicated
                        }
                        Err(e) => self.unresolved(&entry, e),
                    };
                return (outcome, false);
            }
            Ok(None) => {}
            Err(e) => return (self.unresolved(&entry, e), false),
        }

        let outcome = match self.submit(&entry.hash.to_hex()).await {
            Ok(tx_id) => match self.queue.complete(&claim, &tx_id, self.ledger.network()) {
                Ok(_) => EntryOutcome::Anchored,
                Err(e) => self.unresolved(&entry, e),
            },
            Err(ledger_error) => match self.queue.fail(&claim, &ledger_error.to_string()) {
                Ok(AnchorStatus::Failed) => EntryOutcome::Failed,
                Ok(_) => EntryOutcome::Retried,
                Err(e) => self.unresolved(&entry, e),
            },
        };
        (outcome, true)
    }

    fn unresolved(&self, entry: &AnchorQueueEntry, err: AnchorQueueError) -> EntryOutcome {
        if let AnchorQueueError::StaleClaim { .. } = err {
            warn!(
                "[ic-02] Claim on entry {} ({}) was reclaimed before the result arrived",
                entry.id,
                entry.hash.short()
            );
            return EntryOutcome::Unresolved;
        }
        error!(
            "[ic-02] Queue update for entry {} ({}) failed: {}",
            entry.id,
            entry.hash.short(),
            err
        );
        EntryOutcome::Unresolved
    }

    async fn drive(
        &self,
        batch_size: usize,
        deadline: Option<Duration>,
    ) -> Result<RunReport, SubmitterError> {
        let batch = self.queue.claim_batch(batch_size)?;
        let mut report = RunReport {
            claimed: batch.len(),
            ..RunReport::default()
        };
        if batch.is_empty() {
            return Ok(report);
        }

        let mut in_flight: FuturesUnordered<_> =
            batch.into_iter().map(|entry| self.process(entry)).collect();

        let sleep = tokio::time::sleep(deadline.unwrap_or(Duration::MAX));
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                next = in_flight.next() => match next {
                    Some((outcome, called_ledger)) => {
                        if called_ledger {
                            report.submitted += 1;
                        }
                        report.record(outcome);
                    }
                    None => break,
                },
                _ = &mut sleep, if deadline.is_some() => {
                    report.unfinished += in_flight.len();
                    warn!(
                        "[ic-02] ⏱️ Run deadline hit; {} entries left processing",
                        in_flight.len()
                    );
                    break;
                }
            }
        }

        info!(
            "[ic-02] Run on {}: claimed={} submitted={} anchored={} dedup={} retried={} failed={} unfinished={}",
            self.ledger.network(),
            report.claimed,
            report.submitted,
            report.anchored,
            report.deduplicated,
            report.retried,
            report.failed,
            report.unfinished
        );
        Ok(report)
    }
}

#[async_trait]
impl AnchorSubmitterApi for AnchorSubmitter {
    async fn run(&self, batch_size: usize) -> Result<RunReport, SubmitterError> {
        self.drive(batch_size, None).await
    }

    async fn run_with_timeout(
        &self,
        batch_size: usize,
        deadline: Duration,
    ) -> Result<RunReport, SubmitterError> {
        self.drive(batch_size, Some(deadline)).await
    }

    async fn sweep_stalled(&self) -> Result<Vec<(EntryId, AnchorStatus)>, SubmitterError> {
        Ok(self.queue.reclaim_stalled()?)
    }
}
