//! # Anchoring Flows
//!
//! Anchor Queue (ic-01) and Anchor Submitter (ic-02) working together:
//!
//! 1. **Idempotence**: one ledger transaction per distinct hash, however
//!    often it is enqueued
//! 2. **Exclusive claims**: concurrent submitters never submit a hash twice
//! 3. **Retry budget**: failures dead-letter, operator requeue recovers
//! 4. **Stall recovery**: claims abandoned by a crashed submitter are reclaimed

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Duration as ChronoDuration;

    use ic_01_anchor_queue::{
        AnchorQueue, AnchorQueueApi, AnchorQueueConfig, AnchorStatus, EnqueueOutcome,
        InMemoryAnchorStore,
    };
    use ic_02_anchor_submitter::{AnchorSubmitter, AnchorSubmitterApi, MockLedger, SubmitterConfig};
    use shared_crypto::{ContentHash, SubjectType};
    use shared_types::{MockTimeSource, SubjectId};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn record_hash(seed: u32) -> ContentHash {
        let mut digest = [0u8; 32];
        digest[..4].copy_from_slice(&seed.to_be_bytes());
        ContentHash::from_digest(SubjectType::Record, digest)
    }

    fn queue_with_clock(clock: Arc<MockTimeSource>) -> Arc<AnchorQueue> {
        Arc::new(AnchorQueue::with_clock(
            AnchorQueueConfig::for_testing(),
            Arc::new(InMemoryAnchorStore::new()),
            clock,
        ))
    }

    fn submitter(queue: Arc<AnchorQueue>, ledger: Arc<MockLedger>) -> AnchorSubmitter {
        AnchorSubmitter::new(SubmitterConfig::default(), queue, ledger)
    }

    async fn drain(submitter: &AnchorSubmitter) -> usize {
        let mut runs = 0;
        loop {
            let report = submitter.run(16).await.unwrap();
            if report.is_idle() {
                return runs;
            }
            runs += 1;
            assert!(runs < 20, "queue did not drain");
        }
    }

    // =============================================================================
    // IDEMPOTENCE
    // =============================================================================

    #[tokio::test]
    async fn test_same_hash_anchored_once_across_subjects() {
        let clock = Arc::new(MockTimeSource::starting_now());
        let queue = queue_with_clock(clock.clone());
        let ledger = Arc::new(MockLedger::new());
        let submitter = submitter(queue.clone(), ledger.clone());
        let hash = record_hash(7);

        let ids: Vec<_> = ["a", "b", "c"]
            .into_iter()
            .map(|s| queue.enqueue(&hash, SubjectId::new(s)).unwrap().entry_id())
            .collect();

        drain(&submitter).await;

        assert_eq!(ledger.call_count(), 1);
        let anchor = queue.find_anchor(&hash).unwrap().unwrap();
        assert_eq!(anchor.subject_count, 3);
        for id in &ids {
            let entry = queue.get_entry(id).unwrap().unwrap();
            assert_eq!(entry.status, AnchorStatus::Anchored);
            assert_eq!(entry.anchor_id, Some(anchor.id));
        }

        // Enqueue after anchoring resolves immediately.
        match queue.enqueue(&hash, SubjectId::new("d")).unwrap() {
            EnqueueOutcome::AlreadyAnchored { anchor: existing, .. } => {
                assert_eq!(existing.id, anchor.id);
                assert_eq!(existing.subject_count, 4);
            }
            other => panic!("expected AlreadyAnchored, got {other:?}"),
        }
        assert!(submitter.run(16).await.unwrap().is_idle());
        assert_eq!(ledger.call_count(), 1);
    }

    // =============================================================================
    // EXCLUSIVE CLAIMS
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submitters_never_double_submit() {
        let clock = Arc::new(MockTimeSource::starting_now());
        let queue = queue_with_clock(clock);
        let ledger = Arc::new(MockLedger::new().with_delay(Duration::from_millis(2)));

        // 40 distinct hashes plus 20 duplicates of the first 20.
        for seed in 0..40u32 {
            queue.enqueue(&record_hash(seed), SubjectId::new(format!("s{seed}"))).unwrap();
        }
        for seed in 0..20u32 {
            queue.enqueue(&record_hash(seed), SubjectId::new(format!("dup{seed}"))).unwrap();
        }

        let mut handles = Vec::new();
        for _ in 0..4 {
            let queue = queue.clone();
            let submitter = submitter(queue.clone(), ledger.clone());
            handles.push(tokio::spawn(async move {
                loop {
                    let report = submitter.run(8).await.unwrap();
                    if report.is_idle() {
                        let status = queue.status().unwrap();
                        if status.pending == 0 && status.processing == 0 {
                            break;
                        }
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }
        for handle in futures::future::join_all(handles).await {
            handle.unwrap();
        }

        let submitted = ledger.submitted_hashes();
        let distinct: HashSet<_> = submitted.iter().collect();
        assert_eq!(submitted.len(), 40);
        assert_eq!(distinct.len(), 40);

        let status = queue.status().unwrap();
        assert_eq!(status.anchored, 60);
        assert_eq!(status.anchors, 40);
        for seed in 0..20u32 {
            let anchor = queue.find_anchor(&record_hash(seed)).unwrap().unwrap();
            assert_eq!(anchor.subject_count, 2);
        }
    }

    // =============================================================================
    // RETRY BUDGET
    // =============================================================================

    #[tokio::test]
    async fn test_dead_letter_then_operator_requeue() {
        let clock = Arc::new(MockTimeSource::starting_now());
        let queue = queue_with_clock(clock);
        let ledger = Arc::new(MockLedger::failing());
        let submitter = submitter(queue.clone(), ledger.clone());
        let id = queue
            .enqueue(&record_hash(1), SubjectId::new("rec"))
            .unwrap()
            .entry_id();

        for _ in 0..AnchorQueueConfig::for_testing().max_attempts {
            submitter.run(4).await.unwrap();
        }
        let dead = queue.dead_letters().unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].id, id);
        assert!(dead[0].last_error.is_some());
        assert!(submitter.run(4).await.unwrap().is_idle());

        ledger.set_failing(false);
        queue.requeue_dead_letter(&id).unwrap();
        let report = submitter.run(4).await.unwrap();
        assert_eq!(report.anchored, 1);
        assert!(queue.dead_letters().unwrap().is_empty());
    }

    // =============================================================================
    // STALL RECOVERY
    // =============================================================================

    #[tokio::test]
    async fn test_abandoned_claim_is_reclaimed_and_anchored() {
        let clock = Arc::new(MockTimeSource::starting_now());
        let queue = queue_with_clock(clock.clone());
        let ledger = Arc::new(MockLedger::new());
        let submitter = submitter(queue.clone(), ledger.clone());
        queue.enqueue(&record_hash(3), SubjectId::new("rec")).unwrap();

        // A submitter claims and then disappears.
        let claimed = queue.claim_batch(10).unwrap();
        assert_eq!(claimed.len(), 1);
        assert!(submitter.run(10).await.unwrap().is_idle());

        assert!(submitter.sweep_stalled().await.unwrap().is_empty());
        clock.advance(ChronoDuration::seconds(
            AnchorQueueConfig::for_testing().stall_timeout_secs as i64 + 1,
        ));
        let reclaimed = submitter.sweep_stalled().await.unwrap();
        assert_eq!(reclaimed, vec![(claimed[0].id, AnchorStatus::Pending)]);

        assert_eq!(submitter.run(10).await.unwrap().anchored, 1);
        assert_eq!(ledger.call_count(), 1);
    }
}
