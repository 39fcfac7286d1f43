//! # Audit Export Flows
//!
//! Audit Export (ic-04) self-consistency and anchoring of export hashes:
//!
//! 1. The artifact hash is recomputable from the artifact bytes alone
//! 2. The same window exports to the same bytes
//! 3. Every export is itself audited and visible to later exports

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};

    use ic_01_anchor_queue::{AnchorQueue, AnchorQueueApi, AnchorQueueConfig, InMemoryAnchorStore};
    use ic_02_anchor_submitter::{AnchorSubmitter, AnchorSubmitterApi, MockLedger, SubmitterConfig};
    use ic_04_audit_export::{
        AuditExportError, AuditExporter, AuditExporterApi, AuditRow, InMemoryAuditStore, EXPORT_ACTION,
    };
    use shared_crypto::{HashEngine, SubjectType};
    use shared_types::{MockTimeSource, SubjectId, TimeSource, Timestamp};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    fn exporter_with_rows(clock: Arc<MockTimeSource>) -> AuditExporter {
        let exporter = AuditExporter::with_clock(Arc::new(InMemoryAuditStore::new()), clock);
        let rows = [
            AuditRow::new(t0(), "dr-a", "view_record", "record:1", "success").with_ip("10.0.0.1"),
            AuditRow::new(t0() + Duration::minutes(1), "dr-b", "seal_record", "record:2", "success"),
            AuditRow::new(t0() + Duration::minutes(2), "nurse \"c\"", "view_record", "record:2", "denied")
                .with_details("{\"reason\":\"no consent\"}"),
        ];
        for row in rows {
            exporter.record(row).unwrap();
        }
        exporter
    }

    #[test]
    fn test_export_hash_recomputes_from_bytes() {
        let clock = Arc::new(MockTimeSource::new(t0() + Duration::hours(1)));
        let exporter = exporter_with_rows(clock);

        let artifact = exporter.export(t0(), t0() + Duration::minutes(10), "auditor").unwrap();
        assert_eq!(artifact.row_count, 3);
        assert_eq!(artifact.export_hash.subject_type(), SubjectType::AuditExport);
        assert_eq!(artifact.export_hash, HashEngine::digest_audit_export(&artifact.content).unwrap());
        assert!(artifact.verify());
        assert!(exporter.verify_artifact(&artifact.content, &artifact.export_hash));

        let mut tampered = artifact.content.clone();
        let last = tampered.len() - 2;
        tampered[last] ^= 0x01;
        assert!(!exporter.verify_artifact(&tampered, &artifact.export_hash));

        let text = artifact.content_str();
        assert!(text.starts_with("timestamp,user_id,action,resource,status,ip_address,details\n"));
        assert!(text.contains("\"nurse \"\"c\"\"\""));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_same_window_exports_identical_bytes() {
        let clock = Arc::new(MockTimeSource::new(t0() + Duration::hours(1)));
        let exporter = exporter_with_rows(clock.clone());
        let window = (t0(), t0() + Duration::minutes(1));

        let first = exporter.export(window.0, window.1, "auditor").unwrap();
        clock.advance(Duration::minutes(5));
        let second = exporter.export(window.0, window.1, "auditor").unwrap();

        assert_eq!(first.row_count, 2);
        assert_eq!(first.content, second.content);
        assert_eq!(first.export_hash, second.export_hash);
        assert_ne!(first.record_id, second.record_id);
        assert_eq!(exporter.exports().unwrap().len(), 2);
    }

    #[test]
    fn test_export_is_audited_and_visible_later() {
        let clock = Arc::new(MockTimeSource::new(t0() + Duration::hours(1)));
        let exporter = exporter_with_rows(clock.clone());

        let first = exporter.export(t0(), t0() + Duration::minutes(10), "auditor").unwrap();
        clock.advance(Duration::minutes(1));
        let second = exporter.export(t0(), clock.now(), "auditor").unwrap();

        assert_eq!(second.row_count, 4);
        let self_audit = second
            .content_str()
            .lines()
            .find(|line| line.contains(EXPORT_ACTION))
            .unwrap()
            .to_string();
        assert!(self_audit.contains(&first.export_hash.to_hex()));
        assert!(self_audit.contains(&first.record_id.to_string()));

        let records = exporter.exports().unwrap();
        let recorded = records.iter().find(|r| r.id == first.record_id).unwrap();
        assert_eq!(recorded.export_hash, first.export_hash);
        assert_eq!(recorded.row_count, 3);
        assert_eq!(recorded.exported_by, "auditor");
    }

    #[test]
    fn test_inverted_window_rejected() {
        let clock = Arc::new(MockTimeSource::new(t0()));
        let exporter = exporter_with_rows(clock);
        assert!(matches!(
            exporter.export(t0() + Duration::minutes(1), t0(), "auditor"),
            Err(AuditExportError::InvalidRange { .. })
        ));
        assert!(exporter.exports().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_hash_is_anchored() {
        let clock = Arc::new(MockTimeSource::new(t0() + Duration::hours(1)));
        let exporter = exporter_with_rows(clock.clone());
        let queue = Arc::new(AnchorQueue::with_clock(
            AnchorQueueConfig::default(),
            Arc::new(InMemoryAnchorStore::new()),
            clock,
        ));
        let ledger = Arc::new(MockLedger::new());
        let submitter = AnchorSubmitter::new(SubmitterConfig::default(), queue.clone(), ledger.clone());

        let artifact = exporter.export(t0(), t0() + Duration::minutes(10), "auditor").unwrap();
        queue
            .enqueue(&artifact.export_hash, SubjectId::from(artifact.record_id))
            .unwrap();
        assert_eq!(submitter.run(5).await.unwrap().anchored, 1);

        let anchor = queue.find_anchor(&artifact.export_hash).unwrap().unwrap();
        assert_eq!(anchor.hash, artifact.export_hash);
        assert_eq!(ledger.submitted_hashes(), vec![artifact.export_hash.to_hex()]);
    }
}
