//! # Shared Types Crate
//!
//! Primitives used across the integrity subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: identifiers, timestamps and store errors are
//!   defined once here and re-used by every `ic-*` crate.
//! - **Injectable Time**: every subsystem reads the clock through
//!   [`TimeSource`] so state-machine timeouts are testable.
//! - **Canonical Time Text**: timestamps that feed content hashes are rendered
//!   with [`canonical_timestamp`] only.

pub mod entities;
pub mod errors;
pub mod time;

pub use entities::*;
pub use errors::*;
pub use time::*;
