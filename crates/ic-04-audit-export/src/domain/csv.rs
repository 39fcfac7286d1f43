//! Export artifact serialization.
//!
//! Fixed column order, every field double-quoted with embedded quotes
//! doubled, `\n` line endings, RFC 3339 millisecond `Z` timestamps, absent
//! values as `""`. The bytes produced here are what gets hashed, so this
//! format must not change without a new canonical version.

use super::entities::AuditRow;
use shared_types::canonical_timestamp;

/// Column names, in output order.
pub const COLUMNS: [&str; 7] = [
    "timestamp",
    "user_id",
    "action",
    "resource",
    "status",
    "ip_address",
    "details",
];

/// Header line (without newline).
pub fn header() -> String {
    COLUMNS.join(",")
}

fn push_field(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
}

fn push_row(out: &mut String, row: &AuditRow) {
    let timestamp = canonical_timestamp(&row.timestamp);
    let fields = [
        timestamp.as_str(),
        row.user_id.as_str(),
        row.action.as_str(),
        row.resource.as_str(),
        row.status.as_str(),
        row.ip_address.as_deref().unwrap_or(""),
        row.details.as_deref().unwrap_or(""),
    ];
    for (i, value) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, value);
    }
    out.push('\n');
}

/// Serializes rows (in the given order) under the header.
pub fn serialize(rows: &[AuditRow]) -> Vec<u8> {
    let mut out = header();
    out.push('\n');
    for row in rows {
        push_row(&mut out, row);
    }
    out.into_bytes()
}
