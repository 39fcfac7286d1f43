//! Audit trail entities.

use serde::{Deserialize, Serialize};
use shared_crypto::{ContentHash, HashEngine};
use shared_types::{new_id, AuditRowId, Timestamp};
use uuid::Uuid;

/// Action recorded when an export is performed.
pub const EXPORT_ACTION: &str = "export_audit_logs";

/// One immutable audit trail row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRow {
    /// Primary key.
    pub id: AuditRowId,
    /// Event time.
    pub timestamp: Timestamp,
    /// Acting user.
    pub user_id: String,
    /// Action name (e.g. `view_record`).
    pub action: String,
    /// Affected resource.
    pub resource: String,
    /// Outcome (`success`, `denied`, ...).
    pub status: String,
    /// Client address.
    pub ip_address: Option<String>,
    /// Free-form details.
    pub details: Option<String>,
}

impl AuditRow {
    /// Creates a row with a fresh id and no address or details.
    pub fn new(
        timestamp: Timestamp,
        user_id: impl Into<String>,
        action: impl Into<String>,
        resource: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            timestamp,
            user_id: user_id.into(),
            action: action.into(),
            resource: resource.into(),
            status: status.into(),
            ip_address: None,
            details: None,
        }
    }

    /// Sets the client address.
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    /// Sets the details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Record of one export, itself part of the audit trail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditExportRecord {
    /// Primary key.
    pub id: Uuid,
    /// Hash of the exported content.
    pub export_hash: ContentHash,
    /// Rows in the export.
    pub row_count: usize,
    /// Range start (inclusive).
    pub since: Timestamp,
    /// Range end (inclusive).
    pub until: Timestamp,
    /// Export time.
    pub exported_at: Timestamp,
    /// Exporting user.
    pub exported_by: String,
}

/// Export result handed to the caller.
///
/// `export_hash` travels alongside `content` (header or sidecar) so any holder
/// can re-verify the artifact without the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Serialized rows.
    pub content: Vec<u8>,
    /// `digest('audit_export', content)`.
    pub export_hash: ContentHash,
    /// Data rows (header excluded).
    pub row_count: usize,
    /// The persisted `AuditExportRecord`.
    pub record_id: Uuid,
}

impl ExportArtifact {
    /// Content as text.
    pub fn content_str(&self) -> &str {
        std::str::from_utf8(&self.content).unwrap_or_default()
    }

    /// Recomputes the hash of the content and compares.
    pub fn verify(&self) -> bool {
        matches!(HashEngine::digest_audit_export(&self.content), Ok(hash) if hash == self.export_hash)
    }
}
