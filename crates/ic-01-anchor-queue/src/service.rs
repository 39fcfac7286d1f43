//! Anchor Queue Service - state machine driver over an `AnchorStore`.

use crate::domain::{
    AnchorQueueConfig, AnchorQueueEntry, AnchorQueueError, AnchorRecord, AnchorStatus,
    ClaimToken, EnqueueOutcome, QueueStatus,
};
use crate::ports::{AnchorQueueApi, AnchorStore};
use shared_crypto::ContentHash;
use shared_types::{EntryId, SubjectId, SystemTimeSource, TimeSource};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Anchor queue service.
pub struct AnchorQueue {
    config: AnchorQueueConfig,
    store: Arc<dyn AnchorStore>,
    clock: Arc<dyn TimeSource>,
}

impl AnchorQueue {
    /// Creates a queue over `store` using the system clock.
    pub fn new(config: AnchorQueueConfig, store: Arc<dyn AnchorStore>) -> Self {
        Self::with_clock(config, store, Arc::new(SystemTimeSource))
    }

    /// Creates a queue with an injected clock.
    pub fn with_clock(
        config: AnchorQueueConfig,
        store: Arc<dyn AnchorStore>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self { config, store, clock }
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &AnchorQueueConfig {
        &self.config
    }

    fn load(&self, entry_id: &EntryId) -> Result<AnchorQueueEntry, AnchorQueueError> {
        self.store
            .get_entry(entry_id)?
            .ok_or(AnchorQueueError::EntryNotFound(*entry_id))
    }

    /// Loads the entry behind `claim`, requiring it to be processing under
    /// that claim.
    fn load_claimed(
        &self,
        claim: &ClaimToken,
        to: AnchorStatus,
    ) -> Result<AnchorQueueEntry, AnchorQueueError> {
        let entry = self.load(&claim.entry_id)?;
        if !entry.is_processing() {
            return Err(AnchorQueueError::InvalidTransition {
                entry_id: entry.id,
                from: entry.status,
                to,
            });
        }
        if !entry.is_claimed_by(claim) {
            return Err(AnchorQueueError::StaleClaim {
                entry_id: claim.entry_id,
                seq: claim.seq,
            });
        }
        Ok(entry)
    }

    fn swap(
        &self,
        expected: &AnchorQueueEntry,
        updated: &AnchorQueueEntry,
    ) -> Result<(), AnchorQueueError> {
        if self.store.compare_and_swap(expected, updated)? {
            Ok(())
        } else {
            Err(AnchorQueueError::ConcurrentModification(updated.id))
        }
    }
}

impl AnchorQueueApi for AnchorQueue {
    fn enqueue(
        &self,
        hash: &ContentHash,
        subject_id: SubjectId,
    ) -> Result<EnqueueOutcome, AnchorQueueError> {
        let entry = AnchorQueueEntry::new(*hash, subject_id, self.clock.now());
        match self.store.insert_or_attach(&entry)? {
            Some(anchor) => {
                debug!(
                    "[ic-01] {} already anchored as {} ({} subjects)",
                    hash.short(),
                    anchor.external_tx_id,
                    anchor.subject_count
                );
                Ok(EnqueueOutcome::AlreadyAnchored {
                    entry_id: entry.id,
                    anchor,
                })
            }
            None => {
                debug!(
                    "[ic-01] Queued {} for {} {}",
                    hash.short(),
                    entry.subject_type,
                    entry.subject_id
                );
                Ok(EnqueueOutcome::Queued(entry.id))
            }
        }
    }

    fn claim_batch(&self, max: usize) -> Result<Vec<AnchorQueueEntry>, AnchorQueueError> {
        let now = self.clock.now();
        let mut claimed = Vec::with_capacity(max);
        let mut tried = HashSet::new();

        // Entries lost to other claimers or blocked by an in-flight hash are
        // skipped; keep scanning until the batch is full or nothing is left.
        while claimed.len() < max {
            let window = (max - claimed.len()).saturating_add(tried.len());
            let candidates: Vec<EntryId> = self
                .store
                .pending_ids_oldest_first(window)?
                .into_iter()
                .filter(|id| !tried.contains(id))
                .collect();
            if candidates.is_empty() {
                break;
            }
            for id in candidates {
                tried.insert(id);
                if let Some(entry) = self.store.try_claim(&id, now)? {
                    claimed.push(entry);
                    if claimed.len() == max {
                        break;
                    }
                }
            }
        }

        if !claimed.is_empty() {
            debug!("[ic-01] Claimed {} entries", claimed.len());
        }
        Ok(claimed)
    }

    fn complete(
        &self,
        claim: &ClaimToken,
        external_tx_id: &str,
        network: &str,
    ) -> Result<AnchorRecord, AnchorQueueError> {
        let entry = self.load_claimed(claim, AnchorStatus::Anchored)?;
        let now = self.clock.now();
        let candidate = AnchorRecord::new(entry.hash, external_tx_id, network, now);
        let anchor = self
            .store
            .complete_entry(claim, candidate, now)?
            .ok_or(AnchorQueueError::ConcurrentModification(entry.id))?;

        info!(
            "[ic-01] ⚓ {} anchored on {} tx={} (subjects: {})",
            entry.hash.short(),
            anchor.network,
            anchor.external_tx_id,
            anchor.subject_count
        );
        Ok(anchor)
    }

    fn fail(&self, claim: &ClaimToken, error: &str) -> Result<AnchorStatus, AnchorQueueError> {
        let current = self.load_claimed(claim, AnchorStatus::Pending)?;
        let mut entry = current.clone();
        let status = entry.record_failure(error, self.config.max_attempts, self.clock.now())?;
        self.swap(&current, &entry)?;

        match status {
            AnchorStatus::Failed => warn!(
                "[ic-01] ❌ Entry {} dead-lettered after {} attempts: {}",
                entry.id, entry.attempts, error
            ),
            _ => warn!(
                "[ic-01] ⚠️ Entry {} attempt {}/{} failed: {}",
                entry.id, entry.attempts, self.config.max_attempts, error
            ),
        }
        Ok(status)
    }

    fn get_entry(&self, entry_id: &EntryId) -> Result<Option<AnchorQueueEntry>, AnchorQueueError> {
        Ok(self.store.get_entry(entry_id)?)
    }

    fn find_anchor(&self, hash: &ContentHash) -> Result<Option<AnchorRecord>, AnchorQueueError> {
        Ok(self.store.find_anchor_by_hash(hash.digest())?)
    }

    fn dead_letters(&self) -> Result<Vec<AnchorQueueEntry>, AnchorQueueError> {
        Ok(self.store.entries_with_status(AnchorStatus::Failed)?)
    }

    fn requeue_dead_letter(&self, entry_id: &EntryId) -> Result<(), AnchorQueueError> {
        let current = self.load(entry_id)?;
        let mut entry = current.clone();
        entry.requeue(self.clock.now())?;
        self.swap(&current, &entry)?;
        info!("[ic-01] Requeued dead letter {}", entry.id);
        Ok(())
    }

    fn reclaim_stalled(&self) -> Result<Vec<(EntryId, AnchorStatus)>, AnchorQueueError> {
        let now = self.clock.now();
        let timeout = self.config.stall_timeout_secs;
        let mut reclaimed = Vec::new();

        for entry in self.store.entries_with_status(AnchorStatus::Processing)? {
            if !entry.is_stalled(now, timeout) {
                continue;
            }
            // The claim token pins the update to the claim observed stalled
            // here; a claim finished or re-taken since then is left alone.
            let reason = format!("stalled: processing for more than {timeout}s");
            match self.fail(&entry.claim_token(), &reason) {
                Ok(status) => reclaimed.push((entry.id, status)),
                Err(AnchorQueueError::ConcurrentModification(_))
                | Err(AnchorQueueError::StaleClaim { .. })
                | Err(AnchorQueueError::InvalidTransition { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        if !reclaimed.is_empty() {
            info!("[ic-01] Reclaimed {} stalled entries", reclaimed.len());
        }
        Ok(reclaimed)
    }

    fn status(&self) -> Result<QueueStatus, AnchorQueueError> {
        Ok(self.store.status_counts()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryAnchorStore;
    use chrono::Duration;
    use shared_crypto::{HashEngine, SubjectType};
    use shared_types::MockTimeSource;

    struct Fixture {
        queue: Arc<AnchorQueue>,
        clock: Arc<MockTimeSource>,
    }

    fn fixture(config: AnchorQueueConfig) -> Fixture {
        let clock = Arc::new(MockTimeSource::starting_now());
        let queue = AnchorQueue::with_clock(
            config,
            Arc::new(InMemoryAnchorStore::new()),
            clock.clone(),
        );
        Fixture {
            queue: Arc::new(queue),
            clock,
        }
    }

    fn hash(n: u8) -> ContentHash {
        ContentHash::from_digest(SubjectType::Record, [n; 32])
    }

    fn enqueue(f: &Fixture, n: u8) -> EntryId {
        let id = f
            .queue
            .enqueue(&hash(n), SubjectId::new(format!("rec-{n}")))
            .unwrap()
            .entry_id();
        f.clock.advance(Duration::milliseconds(1));
        id
    }

    fn claim_one(f: &Fixture) -> ClaimToken {
        let batch = f.queue.claim_batch(1).unwrap();
        assert_eq!(batch.len(), 1, "nothing to claim");
        batch[0].claim_token()
    }

    #[test]
    fn test_claim_batch_returns_available_then_empty() {
        let f = fixture(AnchorQueueConfig::default());
        for n in 1..=3 {
            enqueue(&f, n);
        }
        let first = f.queue.claim_batch(5).unwrap();
        assert_eq!(first.len(), 3);
        assert!(first.iter().all(|e| e.status == AnchorStatus::Processing));
        assert!(f.queue.claim_batch(5).unwrap().is_empty());
    }

    #[test]
    fn test_claim_batch_is_oldest_first() {
        let f = fixture(AnchorQueueConfig::default());
        let ids: Vec<_> = (1..=4).map(|n| enqueue(&f, n)).collect();
        let batch = f.queue.claim_batch(2).unwrap();
        let claimed: Vec<_> = batch.iter().map(|e| e.id).collect();
        assert_eq!(claimed, ids[..2].to_vec());
    }

    #[test]
    fn test_claim_zero_is_noop() {
        let f = fixture(AnchorQueueConfig::default());
        enqueue(&f, 1);
        assert!(f.queue.claim_batch(0).unwrap().is_empty());
        assert_eq!(f.queue.status().unwrap().pending, 1);
    }

    #[test]
    fn test_duplicate_hash_claims_one_at_a_time() {
        let f = fixture(AnchorQueueConfig::default());
        let first = enqueue(&f, 9);
        let second = enqueue(&f, 9);

        let batch = f.queue.claim_batch(10).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id, first);

        let anchor = f.queue.complete(&batch[0].claim_token(), "tx-9", "mock").unwrap();
        let batch = f.queue.claim_batch(10).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id, second);

        let again = f
            .queue
            .complete(&batch[0].claim_token(), "ignored", "mock")
            .unwrap();
        assert_eq!(again.id, anchor.id);
        assert_eq!(again.external_tx_id, "tx-9");
        assert_eq!(again.subject_count, 2);
    }

    #[test]
    fn test_enqueue_after_anchor_short_circuits() {
        let f = fixture(AnchorQueueConfig::default());
        enqueue(&f, 5);
        let claim = claim_one(&f);
        let anchor = f.queue.complete(&claim, "tx-5", "mock").unwrap();

        let outcome = f.queue.enqueue(&hash(5), SubjectId::new("rec-5b")).unwrap();
        match outcome {
            EnqueueOutcome::AlreadyAnchored { entry_id, anchor: existing } => {
                assert_eq!(existing.id, anchor.id);
                assert_eq!(existing.subject_count, 2);
                let entry = f.queue.get_entry(&entry_id).unwrap().unwrap();
                assert_eq!(entry.status, AnchorStatus::Anchored);
                assert_eq!(entry.anchor_id, Some(anchor.id));
            }
            other => panic!("expected AlreadyAnchored, got {other:?}"),
        }
        assert!(f.queue.claim_batch(5).unwrap().is_empty());
    }

    #[test]
    fn test_fail_retries_until_max_attempts() {
        let config = AnchorQueueConfig {
            max_attempts: 3,
            ..AnchorQueueConfig::default()
        };
        let f = fixture(config);
        let id = enqueue(&f, 1);

        for attempt in 1..3 {
            let claim = claim_one(&f);
            assert_eq!(f.queue.fail(&claim, "ledger down").unwrap(), AnchorStatus::Pending);
            assert_eq!(f.queue.get_entry(&id).unwrap().unwrap().attempts, attempt);
        }
        let claim = claim_one(&f);
        assert_eq!(f.queue.fail(&claim, "ledger down").unwrap(), AnchorStatus::Failed);

        let dead = f.queue.dead_letters().unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].attempts, 3);
        assert_eq!(dead[0].last_error.as_deref(), Some("ledger down"));
        assert!(f.queue.claim_batch(1).unwrap().is_empty());
    }

    #[test]
    fn test_fail_on_pending_is_rejected() {
        let f = fixture(AnchorQueueConfig::default());
        let id = enqueue(&f, 1);
        let entry = f.queue.get_entry(&id).unwrap().unwrap();
        assert!(matches!(
            f.queue.fail(&entry.claim_token(), "x"),
            Err(AnchorQueueError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_complete_unknown_entry() {
        let f = fixture(AnchorQueueConfig::default());
        let missing = shared_types::new_id();
        let claim = ClaimToken {
            entry_id: missing,
            seq: 1,
        };
        assert_eq!(
            f.queue.complete(&claim, "tx", "mock").unwrap_err(),
            AnchorQueueError::EntryNotFound(missing)
        );
    }

    #[test]
    fn test_requeue_dead_letter() {
        let config = AnchorQueueConfig {
            max_attempts: 1,
            ..AnchorQueueConfig::default()
        };
        let f = fixture(config);
        let id = enqueue(&f, 1);
        let claim = claim_one(&f);
        f.queue.fail(&claim, "rejected").unwrap();

        f.queue.requeue_dead_letter(&id).unwrap();
        let entry = f.queue.get_entry(&id).unwrap().unwrap();
        assert_eq!(entry.status, AnchorStatus::Pending);
        assert_eq!(entry.attempts, 0);
        assert!(f.queue.dead_letters().unwrap().is_empty());
        assert!(f.queue.requeue_dead_letter(&id).is_err());
    }

    #[test]
    fn test_reclaim_stalled() {
        let config = AnchorQueueConfig {
            max_attempts: 5,
            stall_timeout_secs: 60,
        };
        let f = fixture(config);
        let id = enqueue(&f, 1);
        f.queue.claim_batch(1).unwrap();

        f.clock.advance(Duration::seconds(30));
        assert!(f.queue.reclaim_stalled().unwrap().is_empty());

        f.clock.advance(Duration::seconds(31));
        let reclaimed = f.queue.reclaim_stalled().unwrap();
        assert_eq!(reclaimed, vec![(id, AnchorStatus::Pending)]);

        let entry = f.queue.get_entry(&id).unwrap().unwrap();
        assert_eq!(entry.attempts, 1);
        assert!(entry.last_error.unwrap().starts_with("stalled"));
        assert_eq!(f.queue.claim_batch(1).unwrap().len(), 1);
    }

    #[test]
    fn test_late_result_from_reclaimed_claim_is_rejected() {
        let config = AnchorQueueConfig {
            max_attempts: 5,
            stall_timeout_secs: 60,
        };
        let f = fixture(config);
        let id = enqueue(&f, 1);
        let stalled = claim_one(&f);

        f.clock.advance(Duration::seconds(61));
        assert_eq!(
            f.queue.reclaim_stalled().unwrap(),
            vec![(id, AnchorStatus::Pending)]
        );
        let current = claim_one(&f);
        assert_ne!(stalled, current);

        // The first submitter reports back after its claim was handed on.
        assert_eq!(
            f.queue.fail(&stalled, "late error").unwrap_err(),
            AnchorQueueError::StaleClaim {
                entry_id: id,
                seq: stalled.seq,
            }
        );
        assert!(matches!(
            f.queue.complete(&stalled, "tx-late", "mock"),
            Err(AnchorQueueError::StaleClaim { .. })
        ));

        let entry = f.queue.get_entry(&id).unwrap().unwrap();
        assert!(entry.is_claimed_by(&current));
        assert_eq!(entry.attempts, 1);
        assert!(f.queue.claim_batch(1).unwrap().is_empty());
        assert!(f.queue.find_anchor(&hash(1)).unwrap().is_none());

        let anchor = f.queue.complete(&current, "tx-1", "mock").unwrap();
        assert_eq!(anchor.external_tx_id, "tx-1");
    }

    #[test]
    fn test_status_counts() {
        let f = fixture(AnchorQueueConfig::default());
        let a = enqueue(&f, 1);
        enqueue(&f, 2);
        enqueue(&f, 3);
        let batch = f.queue.claim_batch(2).unwrap();
        assert_eq!(batch[0].id, a);
        f.queue.complete(&batch[0].claim_token(), "tx", "mock").unwrap();

        let status = f.queue.status().unwrap();
        assert_eq!(status.pending, 1);
        assert_eq!(status.processing, 1);
        assert_eq!(status.anchored, 1);
        assert_eq!(status.anchors, 1);
        assert_eq!(status.total_entries(), 3);
    }

    #[test]
    fn test_concurrent_claims_are_disjoint_and_complete() {
        let f = fixture(AnchorQueueConfig::default());
        let total = 40u8;
        for n in 0..total {
            enqueue(&f, n);
        }

        let batches: Vec<Vec<EntryId>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let queue = f.queue.clone();
                    s.spawn(move || {
                        queue
                            .claim_batch(7)
                            .unwrap()
                            .into_iter()
                            .map(|e| e.id)
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let claimed: Vec<EntryId> = batches.into_iter().flatten().collect();
        let unique: HashSet<_> = claimed.iter().copied().collect();
        assert_eq!(claimed.len(), unique.len(), "an entry was claimed twice");
        assert_eq!(unique.len(), total as usize);
    }

    #[test]
    fn test_audit_export_hashes_enqueue() {
        let f = fixture(AnchorQueueConfig::default());
        let hash = HashEngine::digest_audit_export(b"timestamp,user_id\n").unwrap();
        let id = f
            .queue
            .enqueue(&hash, SubjectId::new("export-1"))
            .unwrap()
            .entry_id();
        let entry = f.queue.get_entry(&id).unwrap().unwrap();
        assert_eq!(entry.subject_type, SubjectType::AuditExport);
    }

    #[test]
    fn test_api_is_object_safe() {
        let f = fixture(AnchorQueueConfig::default());
        let api: Arc<dyn AnchorQueueApi> = f.queue.clone();
        assert_eq!(api.status().unwrap(), QueueStatus::default());
    }
}
