//! # Canonical Serialization
//!
//! Stable, language-independent byte encoding of hashable subjects.
//!
//! ## Encoding (version 1)
//!
//! ```text
//! u32be(len) ‖ subject_tag
//! u32be(field_count)
//! repeat field_count:
//!     u32be(len) ‖ field_name ‖ type_tag:u8 ‖ payload
//! ```
//!
//! | Type | Tag | Payload |
//! |------|-----|---------|
//! | `Absent` | `0x00` | empty |
//! | `Text` | `0x01` | `u32be(len) ‖ utf8` |
//! | `Bytes` | `0x02` | `u32be(len) ‖ bytes` |
//! | `Integer` | `0x03` | `i64be` |
//! | `Timestamp` | `0x04` | `u32be(len) ‖ RFC 3339 millis, Z suffix` |
//! | `TextSet` | `0x05` | `u32be(count) ‖ (u32be(len) ‖ utf8)*`, sorted, de-duplicated |
//!
//! Field order is fixed per subject type and is part of the contract: the
//! schema table in [`SubjectType::schema`] is what every implementation must
//! agree on.

use crate::CryptoError;
use serde::{Deserialize, Serialize};
use shared_types::{canonical_timestamp, Timestamp};
use std::collections::BTreeSet;

/// Version of the canonical encoding produced by this module.
pub const CANONICAL_VERSION: u8 = 1;

const RECORD_SCHEMA: &[&str] = &[
    "record_id",
    "patient_id",
    "provider_id",
    "record_type",
    "content",
    "created_at",
];
const CONSENT_SCHEMA: &[&str] = &[
    "consent_id",
    "subject_did",
    "requester",
    "data_types",
    "duration_secs",
    "created_at",
];
const REVOCATION_SCHEMA: &[&str] = &["consent_id", "revoked_by", "reason", "revoked_at"];
const AUDIT_EXPORT_SCHEMA: &[&str] = &["content"];

/// Kind of subject a content hash is computed over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    /// Medical record.
    Record,
    /// Consent grant.
    Consent,
    /// Consent revocation event.
    Revocation,
    /// Audit-log export batch.
    AuditExport,
}

impl SubjectType {
    /// All subject types.
    pub const ALL: [SubjectType; 4] = [
        SubjectType::Record,
        SubjectType::Consent,
        SubjectType::Revocation,
        SubjectType::AuditExport,
    ];

    /// Wire tag, also the first element of the canonical encoding.
    pub fn tag(&self) -> &'static str {
        match self {
            SubjectType::Record => "record",
            SubjectType::Consent => "consent",
            SubjectType::Revocation => "revocation",
            SubjectType::AuditExport => "audit_export",
        }
    }

    /// Parses a wire tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }

    /// Ordered field names for this subject type.
    pub fn schema(&self) -> &'static [&'static str] {
        match self {
            SubjectType::Record => RECORD_SCHEMA,
            SubjectType::Consent => CONSENT_SCHEMA,
            SubjectType::Revocation => REVOCATION_SCHEMA,
            SubjectType::AuditExport => AUDIT_EXPORT_SCHEMA,
        }
    }
}

impl std::fmt::Display for SubjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A single canonical field value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CanonicalValue {
    /// Optional field with no value.
    Absent,
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Signed integer.
    Integer(i64),
    /// Timestamp (millisecond precision).
    Timestamp(Timestamp),
    /// Unordered set of strings.
    TextSet(BTreeSet<String>),
}

impl CanonicalValue {
    /// Text value from an optional string.
    pub fn optional_text(value: Option<&str>) -> Self {
        match value {
            Some(v) => CanonicalValue::Text(v.to_string()),
            None => CanonicalValue::Absent,
        }
    }

    fn type_tag(&self) -> u8 {
        match self {
            CanonicalValue::Absent => 0x00,
            CanonicalValue::Text(_) => 0x01,
            CanonicalValue::Bytes(_) => 0x02,
            CanonicalValue::Integer(_) => 0x03,
            CanonicalValue::Timestamp(_) => 0x04,
            CanonicalValue::TextSet(_) => 0x05,
        }
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<(), CryptoError> {
        buf.push(self.type_tag());
        match self {
            CanonicalValue::Absent => {}
            CanonicalValue::Text(text) => put_prefixed(buf, text.as_bytes())?,
            CanonicalValue::Bytes(bytes) => put_prefixed(buf, bytes)?,
            CanonicalValue::Integer(n) => buf.extend_from_slice(&n.to_be_bytes()),
            CanonicalValue::Timestamp(ts) => {
                put_prefixed(buf, canonical_timestamp(ts).as_bytes())?
            }
            CanonicalValue::TextSet(items) => {
                put_len(buf, items.len())?;
                for item in items {
                    put_prefixed(buf, item.as_bytes())?;
                }
            }
        }
        Ok(())
    }
}

/// A named canonical field, as supplied to `HashEngine::digest`.
pub type CanonicalField<'a> = (&'a str, CanonicalValue);

fn put_len(buf: &mut Vec<u8>, len: usize) -> Result<(), CryptoError> {
    let prefix = u32::try_from(len).map_err(|_| CryptoError::FieldTooLarge { len })?;
    buf.extend_from_slice(&prefix.to_be_bytes());
    Ok(())
}

fn put_prefixed(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<(), CryptoError> {
    put_len(buf, bytes.len())?;
    buf.extend_from_slice(bytes);
    Ok(())
}

/// Checks `fields` against the subject schema and encodes them.
///
/// # Errors
///
/// - `CryptoError::MalformedCanonicalInput`: a field is missing, extra, or
///   out of order
/// - `CryptoError::FieldTooLarge`: a length does not fit the u32 prefix
pub fn encode(subject: SubjectType, fields: &[CanonicalField<'_>]) -> Result<Vec<u8>, CryptoError> {
    let schema = subject.schema();
    if fields.len() != schema.len() {
        return Err(CryptoError::MalformedCanonicalInput {
            subject: subject.tag(),
            reason: format!("expected {} fields, got {}", schema.len(), fields.len()),
        });
    }
    for (position, ((name, _), expected)) in fields.iter().zip(schema).enumerate() {
        if name != expected {
            return Err(CryptoError::MalformedCanonicalInput {
                subject: subject.tag(),
                reason: format!("field {position} expected `{expected}`, got `{name}`"),
            });
        }
    }
    encode_unchecked(subject, fields)
}

pub(crate) fn encode_unchecked(
    subject: SubjectType,
    fields: &[CanonicalField<'_>],
) -> Result<Vec<u8>, CryptoError> {
    let mut buf = Vec::with_capacity(64 + fields.len() * 32);
    put_prefixed(&mut buf, subject.tag().as_bytes())?;
    put_len(&mut buf, fields.len())?;
    for (name, value) in fields {
        put_prefixed(&mut buf, name.as_bytes())?;
        value.encode_into(&mut buf)?;
    }
    Ok(buf)
}

/// Canonical fields of a medical record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordFields {
    /// Record primary key.
    pub record_id: String,
    /// Owning patient.
    pub patient_id: String,
    /// Authoring provider.
    pub provider_id: String,
    /// Record category (e.g. `lab_result`).
    pub record_type: String,
    /// Record body.
    pub content: String,
    /// Creation time.
    pub created_at: Timestamp,
}

/// Canonical fields of a consent grant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsentFields {
    /// Consent primary key.
    pub consent_id: String,
    /// DID of the patient granting consent.
    pub subject_did: String,
    /// Party the consent is granted to.
    pub requester: String,
    /// Data categories covered.
    pub data_types: BTreeSet<String>,
    /// Validity in seconds.
    pub duration_secs: i64,
    /// Grant time.
    pub created_at: Timestamp,
}

/// Canonical fields of a revocation event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevocationFields {
    /// Revoked consent.
    pub consent_id: String,
    /// Revoking party.
    pub revoked_by: String,
    /// Optional free-text reason.
    pub reason: Option<String>,
    /// Revocation time.
    pub revoked_at: Timestamp,
}

/// Canonical fields of an audit export batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditExportFields {
    /// Serialized export artifact.
    pub content: Vec<u8>,
}

/// Tagged union of every hashable subject, resolved before hashing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CanonicalSubject {
    /// Medical record.
    Record(RecordFields),
    /// Consent grant.
    Consent(ConsentFields),
    /// Revocation event.
    Revocation(RevocationFields),
    /// Audit export batch.
    AuditExport(AuditExportFields),
}

impl CanonicalSubject {
    /// The subject type.
    pub fn subject_type(&self) -> SubjectType {
        match self {
            CanonicalSubject::Record(_) => SubjectType::Record,
            CanonicalSubject::Consent(_) => SubjectType::Consent,
            CanonicalSubject::Revocation(_) => SubjectType::Revocation,
            CanonicalSubject::AuditExport(_) => SubjectType::AuditExport,
        }
    }

    /// Canonical fields in schema order.
    pub fn fields(&self) -> Vec<CanonicalField<'static>> {
        use CanonicalValue as V;
        match self {
            CanonicalSubject::Record(r) => vec![
                ("record_id", V::Text(r.record_id.clone())),
                ("patient_id", V::Text(r.patient_id.clone())),
                ("provider_id", V::Text(r.provider_id.clone())),
                ("record_type", V::Text(r.record_type.clone())),
                ("content", V::Text(r.content.clone())),
                ("created_at", V::Timestamp(r.created_at)),
            ],
            CanonicalSubject::Consent(c) => vec![
                ("consent_id", V::Text(c.consent_id.clone())),
                ("subject_did", V::Text(c.subject_did.clone())),
                ("requester", V::Text(c.requester.clone())),
                ("data_types", V::TextSet(c.data_types.clone())),
                ("duration_secs", V::Integer(c.duration_secs)),
                ("created_at", V::Timestamp(c.created_at)),
            ],
            CanonicalSubject::Revocation(r) => vec![
                ("consent_id", V::Text(r.consent_id.clone())),
                ("revoked_by", V::Text(r.revoked_by.clone())),
                ("reason", V::optional_text(r.reason.as_deref())),
                ("revoked_at", V::Timestamp(r.revoked_at)),
            ],
            CanonicalSubject::AuditExport(e) => vec![("content", V::Bytes(e.content.clone()))],
        }
    }

    /// Canonical encoding of this subject.
    ///
    /// # Errors
    ///
    /// `CryptoError::FieldTooLarge` if a field does not fit the u32 prefix.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, CryptoError> {
        encode_unchecked(self.subject_type(), &self.fields())
    }
}
