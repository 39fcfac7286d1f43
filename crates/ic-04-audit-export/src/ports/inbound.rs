//! # Inbound Port - AuditExporterApi

use crate::domain::{AuditExportError, AuditExportRecord, AuditRow, ExportArtifact};
use shared_crypto::ContentHash;
use shared_types::Timestamp;

/// Audit trail and export API.
pub trait AuditExporterApi: Send + Sync {
    /// Appends a row to the audit trail.
    fn record(&self, row: AuditRow) -> Result<(), AuditExportError>;

    /// Exports rows with `since <= timestamp <= until`.
    ///
    /// Persists an `AuditExportRecord` and appends an `export_audit_logs` row
    /// before returning, so every export is itself audited.
    ///
    /// # Errors
    /// - `InvalidRange`: `since > until`
    fn export(
        &self,
        since: Timestamp,
        until: Timestamp,
        exported_by: &str,
    ) -> Result<ExportArtifact, AuditExportError>;

    /// Recomputes `digest('audit_export', content)` and compares.
    fn verify_artifact(&self, content: &[u8], export_hash: &ContentHash) -> bool;

    /// All exports performed so far, oldest first.
    fn exports(&self) -> Result<Vec<AuditExportRecord>, AuditExportError>;
}
