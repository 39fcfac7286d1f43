//! # Anchor Submitter Subsystem
//!
//! **Subsystem ID:** 2
//!
//! ## Purpose
//!
//! Drains the anchor queue (subsystem 1) into the external ledger. The only
//! component permitted to talk to the ledger. All state transitions go
//! through the queue's atomic operations.
//!
//! ## Guarantees
//!
//! | Property | Mechanism |
//! |----------|-----------|
//! | No hash submitted twice concurrently | claim precedes submission; claim is exclusive per hash |
//! | Already-anchored hashes skip the ledger | `find_anchor` check before `submit` |
//! | Crashed or timed-out runs recover | entries stay `Processing`; `sweep_stalled` fails them back to `Pending` |
//!
//! ## Outbound Dependencies
//!
//! | Dependency | Trait | Purpose |
//! |------------|-------|---------|
//! | Anchor Queue (1) | `AnchorQueueApi` | claim / complete / fail |
//! | External ledger | `Ledger` | `submit(hash_hex) -> tx id` |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::*;
pub use ports::*;
pub use service::AnchorSubmitter;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
