//! # Core Entities
//!
//! Identifier aliases and the timestamp representation shared by all
//! integrity subsystems.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// Wall-clock timestamp (UTC).
pub type Timestamp = DateTime<Utc>;

/// Primary key of an `AnchorQueueEntry`.
pub type EntryId = Uuid;

/// Primary key of an `AnchorRecord`.
pub type AnchorId = Uuid;

/// Primary key of a `ConsentRecord`.
pub type ConsentId = Uuid;

/// Primary key of a `RevocationEvent`.
pub type EventId = Uuid;

/// Primary key of an audit row.
pub type AuditRowId = Uuid;

/// Identifier of the subject a content hash was computed for.
///
/// Opaque to the anchoring pipeline; typically the record/consent/event UUID
/// rendered as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(pub String);

impl SubjectId {
    /// Creates a subject id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Uuid> for SubjectId {
    fn from(id: Uuid) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renders a timestamp as RFC 3339 with millisecond precision and a `Z`
/// suffix.
///
/// This is the only timestamp rendering that may feed a content hash or an
/// export artifact.
pub fn canonical_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Generates a fresh random (v4) identifier.
pub fn new_id() -> Uuid {
    Uuid::new_v4()
}
