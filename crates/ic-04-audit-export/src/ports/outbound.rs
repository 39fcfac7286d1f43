//! Outbound (Driven) ports for the Audit Export subsystem.

use crate::domain::{AuditExportRecord, AuditRow};
use shared_types::{StoreError, Timestamp};

/// Append-only audit storage.
pub trait AuditStore: Send + Sync {
    /// Appends a row.
    fn append(&self, row: &AuditRow) -> Result<(), StoreError>;

    /// Rows with `since <= timestamp <= until`, ordered by `(timestamp, id)`.
    fn rows_between(&self, since: Timestamp, until: Timestamp) -> Result<Vec<AuditRow>, StoreError>;

    /// Persists an export record and the audit row describing it as one
    /// write. Neither is stored if either is rejected.
    ///
    /// # Errors
    /// - `StoreError::Conflict`: `self_audit` already present
    fn record_export(
        &self,
        record: &AuditExportRecord,
        self_audit: &AuditRow,
    ) -> Result<(), StoreError>;

    /// Export records, oldest first.
    fn exports(&self) -> Result<Vec<AuditExportRecord>, StoreError>;
}
