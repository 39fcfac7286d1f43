//! In-memory `AuditStore` keyed by `(timestamp, id)` for ordered range reads.

use crate::domain::{AuditExportRecord, AuditRow};
use crate::ports::AuditStore;
use parking_lot::RwLock;
use shared_types::{AuditRowId, StoreError, Timestamp};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    rows: BTreeMap<(Timestamp, AuditRowId), AuditRow>,
    exports: Vec<AuditExportRecord>,
}

/// Process-local `AuditStore`.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    tables: RwLock<Tables>,
}

impl InMemoryAuditStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.tables.read().rows.len()
    }

    /// Returns true if no rows are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Tables {
    fn insert_row(&mut self, row: &AuditRow) -> Result<(), StoreError> {
        let key = (row.timestamp, row.id);
        if self.rows.contains_key(&key) {
            return Err(StoreError::Conflict(format!("audit row {} exists", row.id)));
        }
        self.rows.insert(key, row.clone());
        Ok(())
    }
}

impl AuditStore for InMemoryAuditStore {
    fn append(&self, row: &AuditRow) -> Result<(), StoreError> {
        self.tables.write().insert_row(row)
    }

    fn rows_between(&self, since: Timestamp, until: Timestamp) -> Result<Vec<AuditRow>, StoreError> {
        if since > until {
            return Ok(Vec::new());
        }
        let tables = self.tables.read();
        Ok(tables
            .rows
            .range((since, Uuid::nil())..=(until, Uuid::max()))
            .map(|(_, row)| row.clone())
            .collect())
    }

    fn record_export(
        &self,
        record: &AuditExportRecord,
        self_audit: &AuditRow,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        tables.insert_row(self_audit)?;
        tables.exports.push(record.clone());
        Ok(())
    }

    fn exports(&self) -> Result<Vec<AuditExportRecord>, StoreError> {
        Ok(self.tables.read().exports.clone())
    }
}
