//! # Consent Flows
//!
//! Consent Revocation (ic-03) with the Anchor Queue (ic-01) and Submitter (ic-02):
//!
//! 1. **Irreversibility**: a revoked consent never becomes active again
//! 2. **Single winner**: concurrent revocations produce exactly one event
//! 3. **Anchored evidence**: grant and revocation hashes both reach the ledger

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Duration as ChronoDuration;

    use ic_01_anchor_queue::{AnchorQueue, AnchorQueueApi, AnchorQueueConfig, InMemoryAnchorStore};
    use ic_02_anchor_submitter::{AnchorSubmitter, AnchorSubmitterApi, MockLedger, SubmitterConfig};
    use ic_03_consent_revocation::{
        ConsentGrant, InMemoryConsentStore, RevocationError, RevocationLedger, RevocationLedgerApi,
    };
    use shared_types::{MockTimeSource, TimeSource};

    const ALICE: &str = "did:example:alice";

    struct Fixture {
        ledger: Arc<RevocationLedger>,
        queue: Arc<AnchorQueue>,
        chain: Arc<MockLedger>,
        clock: Arc<MockTimeSource>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(MockTimeSource::starting_now());
        let queue = Arc::new(AnchorQueue::with_clock(
            AnchorQueueConfig::default(),
            Arc::new(InMemoryAnchorStore::new()),
            clock.clone(),
        ));
        let ledger = Arc::new(RevocationLedger::with_clock(
            Arc::new(InMemoryConsentStore::new()),
            queue.clone(),
            clock.clone(),
        ));
        Fixture {
            ledger,
            queue,
            chain: Arc::new(MockLedger::new()),
            clock,
        }
    }

    fn grant(days: u64) -> ConsentGrant {
        ConsentGrant::new(
            ALICE,
            "research-lab",
            ["labs", "imaging"],
            Duration::from_secs(days * 86_400),
        )
    }

    // =============================================================================
    // IRREVERSIBILITY
    // =============================================================================

    #[test]
    fn test_revoked_consent_stays_revoked() {
        let f = fixture();
        let consent = f.ledger.grant(grant(30)).unwrap();
        assert!(f.ledger.is_active(&consent.id, f.clock.now()).unwrap());

        let event = f.ledger.revoke(&consent.id, ALICE, Some("withdrawn")).unwrap();
        assert!(event.verify_event_hash());

        assert!(matches!(
            f.ledger.revoke(&consent.id, ALICE, None),
            Err(RevocationError::AlreadyRevoked(_))
        ));
        for days in [0, 1, 29] {
            let at = f.clock.now() + ChronoDuration::days(days);
            assert!(!f.ledger.is_active(&consent.id, at).unwrap());
        }

        let stored = f.ledger.get_consent(&consent.id).unwrap().unwrap();
        assert!(stored.revoked);
        assert_eq!(stored.revoked_at, Some(event.revoked_at));
        // Revocation does not alter the grant's evidence.
        assert!(stored.verify_creation_hash());
        assert_eq!(stored.creation_hash, consent.creation_hash);
        assert_eq!(f.ledger.revocation_event(&consent.id).unwrap(), Some(event));
    }

    #[test]
    fn test_only_subject_may_revoke() {
        let f = fixture();
        let consent = f.ledger.grant(grant(1)).unwrap();
        assert!(matches!(
            f.ledger.revoke(&consent.id, "research-lab", None),
            Err(RevocationError::Unauthorized { .. })
        ));
        assert!(f.ledger.is_active(&consent.id, f.clock.now()).unwrap());
        assert_eq!(f.ledger.revocation_event(&consent.id).unwrap(), None);
    }

    // =============================================================================
    // SINGLE WINNER
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_revocations_single_event() {
        let f = fixture();
        let consent = f.ledger.grant(grant(7)).unwrap();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let ledger = f.ledger.clone();
                let id = consent.id;
                tokio::task::spawn_blocking(move || {
                    ledger.revoke(&id, ALICE, Some(&format!("attempt {i}")))
                })
            })
            .collect();

        let mut winners = 0;
        for handle in futures::future::join_all(handles).await {
            match handle.unwrap() {
                Ok(_) => winners += 1,
                Err(RevocationError::AlreadyRevoked(_)) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(winners, 1);
        // grant + one revocation
        assert_eq!(f.queue.status().unwrap().pending, 2);
    }

    // =============================================================================
    // ANCHORED EVIDENCE
    // =============================================================================

    #[tokio::test]
    async fn test_grant_and_revocation_hashes_are_anchored() {
        let f = fixture();
        let consent = f.ledger.grant(grant(30)).unwrap();
        f.clock.advance(ChronoDuration::seconds(5));
        let event = f.ledger.revoke(&consent.id, ALICE, None).unwrap();

        let submitter = AnchorSubmitter::new(SubmitterConfig::default(), f.queue.clone(), f.chain.clone());
        let report = submitter.run(10).await.unwrap();
        assert_eq!(report.anchored, 2);

        let grant_anchor = f.queue.find_anchor(&consent.creation_hash).unwrap().unwrap();
        let revoke_anchor = f.queue.find_anchor(&event.event_hash).unwrap().unwrap();
        assert_ne!(grant_anchor.external_tx_id, revoke_anchor.external_tx_id);
        assert_eq!(
            f.chain.submitted_hashes(),
            vec![consent.creation_hash.to_hex(), event.event_hash.to_hex()]
        );
    }

    #[test]
    fn test_consent_expires_without_revocation() {
        let f = fixture();
        let consent = f.ledger.grant(grant(1)).unwrap();
        f.clock.advance(ChronoDuration::days(1) + ChronoDuration::seconds(1));
        assert!(!f.ledger.is_active(&consent.id, f.clock.now()).unwrap());
        // Expiry is not revocation: the subject can still record a withdrawal.
        assert!(f.ledger.revoke(&consent.id, ALICE, None).is_ok());
    }
}
