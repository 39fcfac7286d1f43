//! # End-to-End Pipeline
//!
//! The runtime container wired as in production, driven through the
//! `IntegrityPipeline` facade and the `AnchorScheduler`:
//!
//! ```text
//! seal_record ──→ AnchorQueue ←── grant/revoke_consent
//!                     ↑                    
//!   export_audit ─────┘
//!                     │
//!         AnchorScheduler.run_once
//!                     ↓
//!                  Ledger
//! ```

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Duration as ChronoDuration;
    use tokio::sync::watch;

    use ic_01_anchor_queue::{EnqueueOutcome, InMemoryAnchorStore};
    use ic_02_anchor_submitter::MockLedger;
    use ic_03_consent_revocation::ConsentGrant;
    use integrity_runtime::{
        AnchorScheduler, IntegrityContainer, IntegrityPipeline, RuntimeConfig, SchedulerSettings,
    };
    use shared_crypto::RecordFields;
    use shared_types::{MockTimeSource, TimeSource, Timestamp};

    struct Node {
        container: IntegrityContainer,
        pipeline: IntegrityPipeline,
        ledger: Arc<MockLedger>,
        clock: Arc<MockTimeSource>,
    }

    fn node() -> Node {
        let ledger = Arc::new(MockLedger::new());
        let clock = Arc::new(MockTimeSource::starting_now());
        let container = IntegrityContainer::with_parts(
            RuntimeConfig::default(),
            Arc::new(InMemoryAnchorStore::new()),
            ledger.clone(),
            clock.clone(),
        );
        let pipeline = IntegrityPipeline::new(&container);
        Node {
            container,
            pipeline,
            ledger,
            clock,
        }
    }

    fn lab_result(record_id: &str, content: &str, at: Timestamp) -> RecordFields {
        RecordFields {
            record_id: record_id.into(),
            patient_id: "patient-42".into(),
            provider_id: "clinic-3".into(),
            record_type: "lab_result".into(),
            content: content.into(),
            created_at: at,
        }
    }

    fn scheduler(node: &Node) -> AnchorScheduler {
        AnchorScheduler::new(
            node.container.submitter.clone(),
            SchedulerSettings::from(&node.container.config.anchoring),
        )
    }

    #[tokio::test]
    async fn test_full_day_of_activity_is_anchored() {
        let n = node();
        let start = n.clock.now();
        let keys = n.container.cipher.generate_keypair();

        // Records; the retransmitted one hashes identically.
        let r1 = lab_result("rec-1", "glucose 5.1 mmol/L", start);
        let r2 = lab_result("rec-2", "ldl 2.4 mmol/L", start);
        let sealed1 = n.pipeline.seal_record(r1.clone(), &keys.public, "dr-a").unwrap();
        n.clock.advance(ChronoDuration::seconds(1));
        let sealed2 = n.pipeline.seal_record(r2, &keys.public, "dr-a").unwrap();
        n.clock.advance(ChronoDuration::seconds(1));
        let resealed1 = n.pipeline.seal_record(r1, &keys.public, "dr-a").unwrap();
        assert_eq!(sealed1.content_hash, resealed1.content_hash);
        assert_ne!(sealed1.payload.ciphertext, resealed1.payload.ciphertext);

        // Consent lifecycle.
        n.clock.advance(ChronoDuration::seconds(1));
        let consent = n
            .pipeline
            .grant_consent(ConsentGrant::new(
                "did:example:patient-42",
                "clinic-3",
                ["labs"],
                Duration::from_secs(86_400),
            ))
            .unwrap();
        n.clock.advance(ChronoDuration::seconds(1));
        let revocation = n
            .pipeline
            .revoke_consent(&consent.id, "did:example:patient-42", Some("second opinion"))
            .unwrap();

        // Audit export of everything so far.
        n.clock.advance(ChronoDuration::seconds(1));
        let artifact = n.pipeline.export_audit(start, n.clock.now(), "compliance").unwrap();
        assert_eq!(artifact.row_count, 5);
        assert!(artifact.verify());

        let scheduler = scheduler(&n);
        let mut anchored = 0;
        let mut deduplicated = 0;
        for _ in 0..10 {
            let report = scheduler.run_once().await.unwrap();
            if report.is_idle() {
                break;
            }
            anchored += report.anchored;
            deduplicated += report.deduplicated;
        }

        // rec-1, rec-2, grant, revocation, export
        assert_eq!(anchored, 5);
        assert_eq!(deduplicated, 1);
        assert_eq!(n.ledger.call_count(), 5);

        for hash in [
            &sealed1.content_hash,
            &sealed2.content_hash,
            &consent.creation_hash,
            &revocation.event_hash,
            &artifact.export_hash,
        ] {
            assert!(n.pipeline.anchor_for(hash).unwrap().is_some(), "{hash} not anchored");
        }
        let rec1_anchor = n.pipeline.anchor_for(&sealed1.content_hash).unwrap().unwrap();
        assert_eq!(rec1_anchor.subject_count, 2);

        let status = n.container.anchor_queue.status().unwrap();
        assert_eq!(status.anchored, 6);
        assert_eq!(status.anchors, 5);
        assert_eq!(status.pending + status.processing + status.failed, 0);

        // Decryption still round-trips after anchoring.
        let opened = n.pipeline.open_record(&sealed2.payload, &keys.private).unwrap();
        assert_eq!(opened, b"ldl 2.4 mmol/L");
    }

    #[tokio::test]
    async fn test_reseal_after_anchor_resolves_without_ledger() {
        let n = node();
        let keys = n.container.cipher.generate_keypair();
        let record = lab_result("rec-9", "hb 140 g/L", n.clock.now());

        n.pipeline.seal_record(record.clone(), &keys.public, "dr-a").unwrap();
        n.pipeline.anchor_pending().await.unwrap();
        assert_eq!(n.ledger.call_count(), 1);

        let again = n.pipeline.seal_record(record, &keys.public, "dr-b").unwrap();
        match again.anchor {
            Some(EnqueueOutcome::AlreadyAnchored { anchor, .. }) => assert_eq!(anchor.subject_count, 2),
            other => panic!("expected AlreadyAnchored, got {other:?}"),
        }
        assert!(n.pipeline.anchor_pending().await.unwrap().is_idle());
        assert_eq!(n.ledger.call_count(), 1);
    }

    #[tokio::test]
    async fn test_ledger_outage_does_not_block_requests() {
        let n = node();
        n.ledger.set_failing(true);
        let keys = n.container.cipher.generate_keypair();

        let mut hashes = HashMap::new();
        for i in 0..3 {
            let record = lab_result(&format!("rec-{i}"), "bp 120/80", n.clock.now());
            let sealed = n.pipeline.seal_record(record, &keys.public, "dr-a").unwrap();
            hashes.insert(i, sealed.content_hash);
        }
        let report = n.pipeline.anchor_pending().await.unwrap();
        assert_eq!(report.retried, 3);

        n.ledger.set_failing(false);
        let report = n.pipeline.anchor_pending().await.unwrap();
        assert_eq!(report.anchored, 3);
        for hash in hashes.values() {
            assert!(n.pipeline.anchor_for(hash).unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_scheduler_drains_queue_then_stops() {
        let n = node();
        let keys = n.container.cipher.generate_keypair();
        for i in 0..4 {
            let record = lab_result(&format!("rec-{i}"), "temp 36.8C", n.clock.now());
            n.pipeline.seal_record(record, &keys.public, "dr-a").unwrap();
        }

        let settings = SchedulerSettings {
            batch_size: 2,
            interval: Duration::from_millis(10),
            run_timeout: Duration::from_secs(1),
            sweep_interval: Duration::from_millis(25),
        };
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = AnchorScheduler::new(n.container.submitter.clone(), settings).spawn(shutdown_rx);

        let queue = n.container.anchor_queue.clone();
        tokio::time::timeout(Duration::from_secs(5), async move {
            while queue.status().unwrap().anchored < 4 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
        assert_eq!(n.ledger.call_count(), 4);
    }

    #[tokio::test]
    async fn test_container_from_environment_with_simulated_ledger() {
        let config = RuntimeConfig::from_lookup(|key| match key {
            "IC_LEDGER_NETWORK" => Some("integration-net".to_string()),
            "IC_LEDGER_LATENCY_MS" => Some("0".to_string()),
            "IC_BATCH_SIZE" => Some("4".to_string()),
            _ => None,
        })
        .unwrap();
        let container = IntegrityContainer::new(config).unwrap();
        let pipeline = IntegrityPipeline::new(&container);
        let keys = container.cipher.generate_keypair();

        let record = lab_result("rec-env", "spo2 98%", chrono::Utc::now());
        let sealed = pipeline.seal_record(record, &keys.public, "dr-env").unwrap();
        assert_eq!(pipeline.anchor_pending().await.unwrap().anchored, 1);

        let anchor = pipeline.anchor_for(&sealed.content_hash).unwrap().unwrap();
        assert_eq!(anchor.network, "integration-net");
        assert!(anchor.external_tx_id.starts_with("0x"));
    }
}
