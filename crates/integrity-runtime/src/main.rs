//! # Integrity Runtime
//!
//! Entry point for the anchoring service.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from `IC_*` environment variables
//! 2. Initialize logging
//! 3. Validate configuration and build the subsystem container
//! 4. Spawn the anchoring scheduler
//! 5. Wait for Ctrl+C, then signal shutdown and drain the scheduler

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use integrity_runtime::telemetry::init_logging;
use integrity_runtime::{AnchorScheduler, IntegrityContainer, RuntimeConfig, SchedulerSettings};

/// Upper bound on how long shutdown waits for the scheduler.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// The runtime owning the container and background tasks.
struct IntegrityRuntime {
    container: IntegrityContainer,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    scheduler: Option<JoinHandle<()>>,
}

impl IntegrityRuntime {
    fn new(config: RuntimeConfig) -> Result<Self> {
        let container = IntegrityContainer::new(config).context("failed to build subsystem container")?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            container,
            shutdown_tx,
            shutdown_rx,
            scheduler: None,
        })
    }

    fn start(&mut self) {
        let config = &self.container.config;
        info!("===========================================");
        info!("  Integrity Runtime v{}", integrity_runtime::VERSION);
        info!("===========================================");
        info!("Ledger network: {}", config.ledger.network);
        info!("Storage: {:?} at {:?}", config.storage.backend, config.storage.data_dir);

        let scheduler = AnchorScheduler::new(
            self.container.submitter.clone(),
            SchedulerSettings::from(&config.anchoring),
        );
        self.scheduler = Some(scheduler.spawn(self.shutdown_rx.clone()));
    }

    async fn shutdown(mut self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        if let Some(handle) = self.scheduler.take() {
            match tokio::time::timeout(SHUTDOWN_GRACE, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Scheduler task failed: {}", e),
                Err(_) => warn!("Scheduler did not stop within {:?}", SHUTDOWN_GRACE),
            }
        }

        match self.container.anchor_queue.status() {
            Ok(status) => info!(
                "Queue at shutdown: pending={} processing={} anchored={} failed={}",
                status.pending, status.processing, status.anchored, status.failed
            ),
            Err(e) => warn!("Could not read queue status: {}", e),
        }
        info!("Shutdown complete");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env().context("invalid environment configuration")?;
    init_logging(&config.telemetry)?;

    let mut runtime = IntegrityRuntime::new(config)?;
    runtime.start();

    info!("Runtime is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
