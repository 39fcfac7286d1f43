//! # Domain Layer - Anchor Submitter Subsystem
//!
//! - `entities`: `SubmitterConfig`, `RunReport`, `EntryOutcome`
//! - `errors`: `SubmitterError`, `LedgerError`

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
