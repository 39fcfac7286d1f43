//! # Integrity Runtime
//!
//! Wiring, configuration and scheduling for the integrity pipeline.
//!
//! ## Modular Structure
//!
//! - `config` - `RuntimeConfig` with `IC_*` environment overrides
//! - `telemetry` - tracing subscriber setup (pretty or JSON)
//! - `adapters/` - simulated ledger and the optional RocksDB anchor store
//! - `container/` - subsystem construction in dependency order
//! - `pipeline` - request-path facade (seal, consent, export)
//! - `scheduler` - periodic submitter runs and stall sweeps
//!
//! ## Data Flow
//!
//! ```text
//!  request ──→ IntegrityPipeline ──┬──→ HybridCipher (encrypt)
//!                                  ├──→ HashEngine ──→ AnchorQueue (ic-01)
//!                                  ├──→ RevocationLedger (ic-03) ──→ AnchorQueue
//!                                  └──→ AuditExporter (ic-04) ──→ AnchorQueue
//!
//!  AnchorScheduler ──interval──→ AnchorSubmitter (ic-02) ──→ Ledger
//!                 ──sweep────→ AnchorQueue.reclaim_stalled
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod container;
pub mod pipeline;
pub mod scheduler;
pub mod telemetry;

pub use config::{ConfigError, RuntimeConfig, StorageBackend};
pub use container::{ContainerError, IntegrityContainer};
pub use pipeline::{IntegrityPipeline, PipelineError, SealedRecord};
pub use scheduler::{AnchorScheduler, SchedulerSettings};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
