//! # Consent & Revocation Subsystem
//!
//! **Subsystem ID:** 3
//!
//! ## Purpose
//!
//! Records patient data-sharing consents and their irrevocable withdrawal.
//! Both the grant and the revocation are hashed under separate lineages and
//! queued for anchoring (subsystem 1).
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | `revoked` flips false → true exactly once | `ConsentRecord::mark_revoked` under the store's write lock |
//! | No half-revoked state | `ConsentStore::revoke` writes flag and event in one unit |
//! | Two concurrent revokes: one wins | store-level compare-and-swap; loser gets `AlreadyRevoked` |
//! | Only the subject may revoke | `RevocationLedger::revoke` |
//! | Anchoring never blocks the primary action | queue errors are logged, not returned |
//!
//! ```text
//! grant ──→ ConsentRecord{revoked=false} ──enqueue(creation_hash)──→ Anchor Queue
//!                 │
//!              revoke (CAS)
//!                 ↓
//! ConsentRecord{revoked=true} + RevocationEvent ──enqueue(event_hash)──→ Anchor Queue
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
pub use service::RevocationLedger;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
