//! # Subsystem Container
//!
//! ## Initialization Order
//!
//! ```text
//! Level 0: Anchor store, ledger connector, clock
//! Level 1: Anchor Queue (ic-01), Audit Export (ic-04)
//! Level 2: Anchor Submitter (ic-02), Consent Revocation (ic-03)
//! ```
//!
//! Every subsystem is held behind its inbound port so the pipeline and the
//! scheduler never depend on concrete adapters.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use ic_01_anchor_queue::{AnchorQueue, AnchorQueueApi, AnchorQueueConfig, AnchorStore, InMemoryAnchorStore};
use ic_02_anchor_submitter::{AnchorSubmitter, AnchorSubmitterApi, Ledger, SubmitterConfig};
use ic_03_consent_revocation::{InMemoryConsentStore, RevocationLedger, RevocationLedgerApi};
use ic_04_audit_export::{AuditExporter, AuditExporterApi, InMemoryAuditStore};
use shared_crypto::HybridCipher;
use shared_types::{StoreError, SystemTimeSource, TimeSource};

use crate::adapters::SimulatedLedger;
use crate::config::{ConfigError, RuntimeConfig, StorageBackend};

/// Container construction errors.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Configuration rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Storage backend failed to open.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Central container holding all subsystem instances.
#[derive(Clone)]
pub struct IntegrityContainer {
    /// Hybrid cipher for record payloads.
    pub cipher: HybridCipher,
    /// Anchor Queue (ic-01).
    pub anchor_queue: Arc<dyn AnchorQueueApi>,
    /// Anchor Submitter (ic-02).
    pub submitter: Arc<dyn AnchorSubmitterApi>,
    /// Consent Revocation Ledger (ic-03).
    pub revocations: Arc<dyn RevocationLedgerApi>,
    /// Audit Exporter (ic-04).
    pub audit: Arc<dyn AuditExporterApi>,
    /// Shared clock.
    pub clock: Arc<dyn TimeSource>,
    /// Runtime configuration (immutable after initialization).
    pub config: RuntimeConfig,
}

impl std::fmt::Debug for IntegrityContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegrityContainer")
            .field("cipher", &self.cipher)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl IntegrityContainer {
    /// Validates `config`, opens the configured anchor store and wires the
    /// simulated ledger.
    pub fn new(config: RuntimeConfig) -> Result<Self, ContainerError> {
        config.validate()?;
        let store = open_anchor_store(&config)?;
        let ledger: Arc<dyn Ledger> = Arc::new(SimulatedLedger::new(&config.ledger));
        Ok(Self::with_parts(config, store, ledger, Arc::new(SystemTimeSource)))
    }

    /// Wires the subsystems around explicit adapters.
    pub fn with_parts(
        config: RuntimeConfig,
        anchor_store: Arc<dyn AnchorStore>,
        ledger: Arc<dyn Ledger>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        info!("[ic-runtime] Initializing subsystem container");

        let queue_config = AnchorQueueConfig {
            max_attempts: config.anchoring.max_attempts,
            stall_timeout_secs: config.anchoring.stall_timeout_secs,
        };
        let anchor_queue: Arc<dyn AnchorQueueApi> =
            Arc::new(AnchorQueue::with_clock(queue_config, anchor_store, Arc::clone(&clock)));
        info!("  [ic-01] Anchor Queue initialized");

        let audit: Arc<dyn AuditExporterApi> = Arc::new(AuditExporter::with_clock(
            Arc::new(InMemoryAuditStore::new()),
            Arc::clone(&clock),
        ));
        info!("  [ic-04] Audit Exporter initialized");

        let submitter: Arc<dyn AnchorSubmitterApi> = Arc::new(AnchorSubmitter::new(
            SubmitterConfig {
                submit_timeout_ms: config.anchoring.submit_timeout_ms,
            },
            Arc::clone(&anchor_queue),
            ledger,
        ));
        info!("  [ic-02] Anchor Submitter initialized");

        let revocations: Arc<dyn RevocationLedgerApi> = Arc::new(RevocationLedger::with_clock(
            Arc::new(InMemoryConsentStore::new()),
            Arc::clone(&anchor_queue),
            Arc::clone(&clock),
        ));
        info!("  [ic-03] Consent Revocation Ledger initialized");

        Self {
            cipher: HybridCipher::new(),
            anchor_queue,
            submitter,
            revocations,
            audit,
            clock,
            config,
        }
    }
}

fn open_anchor_store(config: &RuntimeConfig) -> Result<Arc<dyn AnchorStore>, ContainerError> {
    match config.storage.backend {
        StorageBackend::Memory => {
            info!("  [ic-01] Using in-memory anchor store");
            Ok(Arc::new(InMemoryAnchorStore::new()))
        }
        #[cfg(feature = "rocksdb")]
        StorageBackend::RocksDb => {
            use crate::adapters::storage::{RocksDbAnchorStore, RocksDbConfig};
            let store = RocksDbAnchorStore::open(RocksDbConfig::in_data_dir(&config.storage.data_dir))?;
            info!("  [ic-01] Using RocksDB anchor store at {}", store.path().display());
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "rocksdb"))]
        StorageBackend::RocksDb => Err(ConfigError::RocksDbUnavailable.into()),
    }
}
