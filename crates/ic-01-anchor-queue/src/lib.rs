//! # Anchor Queue Subsystem
//!
//! **Subsystem ID:** 1
//!
//! ## Purpose
//!
//! Durable work queue of content hashes awaiting blockchain anchoring. Every
//! hash computed for a record, consent, revocation or audit export is
//! enqueued here and later claimed by the Anchor Submitter (subsystem 2).
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Exclusive claim: no entry is handed to two submitters | `AnchorStore::try_claim` conditional update |
//! | One processing entry per hash at a time | `InMemoryAnchorStore` in-flight hash index |
//! | At most one `AnchorRecord` per hash | `AnchorStore::complete_entry` |
//! | Entries are never deleted | no delete operation exists |
//! | Bounded retries | `AnchorQueueEntry::record_failure` |
//!
//! ## State Machine
//!
//! ```text
//! [PENDING] ──claim_batch──→ [PROCESSING] ──complete──→ [ANCHORED]
//!     ↑                           │
//!     └──── fail (attempts < max) ┤
//!     └──── reclaim_stalled ──────┤
//!                                 └── fail (attempts ≥ max) ──→ [FAILED]
//!                                                                  │
//!     ↑──────────────────── requeue_dead_letter ───────────────────┘
//! ```
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  adapters/memory.rs  - InMemoryAnchorStore                      │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ports/inbound.rs  - AnchorQueueApi trait                       │
//! │  ports/outbound.rs - AnchorStore trait                          │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  domain/entities.rs      - AnchorQueueEntry, AnchorRecord       │
//! │  domain/value_objects.rs - EnqueueOutcome, QueueStatus          │
//! │  domain/errors.rs        - AnchorQueueError                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::*;
pub use domain::*;
pub use ports::*;
pub use service::AnchorQueue;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
