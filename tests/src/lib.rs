//! # Integrity-Core Test Suite
//!
//! Cross-subsystem tests that no single crate can own.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── anchoring_flows.rs   # queue + submitter: idempotence, exclusive claims
//!     ├── consent_flows.rs     # revocation irreversibility and its anchors
//!     ├── audit_flows.rs       # export self-consistency
//!     └── e2e_pipeline.rs      # runtime container, pipeline and scheduler
//! tests/benches/
//! └── integrity_benchmarks.rs  # hashing, hybrid encryption, queue throughput
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ic-tests
//! cargo test -p ic-tests integration::anchoring_flows
//! cargo bench -p ic-tests
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
