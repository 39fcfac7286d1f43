//! # Audit Export Subsystem
//!
//! **Subsystem ID:** 4
//!
//! ## Purpose
//!
//! Serializes a range of the immutable audit trail into a fixed-format
//! artifact, hashes it with `digest('audit_export', content)`, and records the
//! export in the trail itself before returning.
//!
//! ## Artifact Format
//!
//! ```text
//! timestamp,user_id,action,resource,status,ip_address,details
//! "2024-05-06T07:08:09.000Z","u-1","view_record","records/42","success","10.0.0.1",""
//! ```
//!
//! | Rule | Value |
//! |------|-------|
//! | Row order | `(timestamp, id)` ascending |
//! | Quoting | every field quoted, `"` doubled |
//! | Line ending | `\n` |
//! | Timestamps | RFC 3339, millisecond precision, `Z` |
//!
//! The hash is delivered next to the content so holders can verify the
//! artifact offline with `HashEngine::digest_audit_export`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::*;
pub use domain::*;
pub use ports::*;
pub use service::AuditExporter;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
