//! # Domain Layer - Audit Export Subsystem
//!
//! - `entities`: `AuditRow`, `AuditExportRecord`, `ExportArtifact`
//! - `csv`: fixed-format artifact serialization
//! - `errors`: `AuditExportError`

pub mod csv;
pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
