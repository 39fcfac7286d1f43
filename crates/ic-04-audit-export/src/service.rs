//! Audit Exporter Service

use crate::domain::{
    csv, AuditExportError, AuditExportRecord, AuditRow, ExportArtifact, EXPORT_ACTION,
};
use crate::ports::{AuditExporterApi, AuditStore};
use shared_crypto::{ContentHash, HashEngine};
use shared_types::{canonical_timestamp, new_id, SystemTimeSource, TimeSource, Timestamp};
use std::sync::Arc;
use tracing::info;

/// Audit exporter implementation.
pub struct AuditExporter {
    store: Arc<dyn AuditStore>,
    clock: Arc<dyn TimeSource>,
}

impl AuditExporter {
    /// Creates an exporter using the system clock.
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemTimeSource))
    }

    /// Creates an exporter with an injected clock.
    pub fn with_clock(store: Arc<dyn AuditStore>, clock: Arc<dyn TimeSource>) -> Self {
        Self { store, clock }
    }
}

impl AuditExporterApi for AuditExporter {
    fn record(&self, row: AuditRow) -> Result<(), AuditExportError> {
        Ok(self.store.append(&row)?)
    }

    fn export(
        &self,
        since: Timestamp,
        until: Timestamp,
        exported_by: &str,
    ) -> Result<ExportArtifact, AuditExportError> {
        if since > until {
            return Err(AuditExportError::InvalidRange { since, until });
        }

        let rows = self.store.rows_between(since, until)?;
        let content = csv::serialize(&rows);
        let export_hash = HashEngine::digest_audit_export(&content)?;
        let exported_at = self.clock.now();

        let record = AuditExportRecord {
            id: new_id(),
            export_hash,
            row_count: rows.len(),
            since,
            until,
            exported_at,
            exported_by: exported_by.to_string(),
        };
        let details = serde_json::json!({
            "export_id": record.id.to_string(),
            "export_hash": export_hash.to_hex(),
            "row_count": rows.len(),
            "since": canonical_timestamp(&since),
            "until": canonical_timestamp(&until),
        });
        let self_audit = AuditRow::new(exported_at, exported_by, EXPORT_ACTION, "audit_logs", "success")
            .with_details(details.to_string());
        self.store.record_export(&record, &self_audit)?;

        info!(
            "[ic-04] 📤 Exported {} audit rows for {} (hash {})",
            rows.len(),
            exported_by,
            export_hash.short()
        );

        Ok(ExportArtifact {
            content,
            export_hash,
            row_count: rows.len(),
            record_id: record.id,
        })
    }

    fn verify_artifact(&self, content: &[u8], export_hash: &ContentHash) -> bool {
        matches!(HashEngine::digest_audit_export(content), Ok(hash) if hash == *export_hash)
    }

    fn exports(&self) -> Result<Vec<AuditExportRecord>, AuditExportError> {
        Ok(self.store.exports()?)
    }
}
