//! # Anchoring Scheduler
//!
//! Drives the submitter on a fixed interval and sweeps stalled claims on a
//! second, slower one. Stops on the runtime's shutdown signal; a run already
//! in progress finishes first, bounded by its own deadline.

use std::sync::Arc;
use std::time::Duration;

use ic_02_anchor_submitter::{AnchorSubmitterApi, RunReport};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::AnchoringConfig;

/// Scheduler timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Entries claimed per run.
    pub batch_size: usize,
    /// Time between runs.
    pub interval: Duration,
    /// Deadline for one run.
    pub run_timeout: Duration,
    /// Time between stall sweeps.
    pub sweep_interval: Duration,
}

impl From<&AnchoringConfig> for SchedulerSettings {
    fn from(config: &AnchoringConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            interval: config.interval(),
            run_timeout: config.run_timeout(),
            sweep_interval: config.sweep_interval(),
        }
    }
}

/// Periodic anchoring driver.
pub struct AnchorScheduler {
    submitter: Arc<dyn AnchorSubmitterApi>,
    settings: SchedulerSettings,
}

impl AnchorScheduler {
    /// Creates a scheduler over `submitter`.
    pub fn new(submitter: Arc<dyn AnchorSubmitterApi>, settings: SchedulerSettings) -> Self {
        Self { submitter, settings }
    }

    /// Spawns the loop on the current runtime.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Runs until `shutdown` flips or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut anchor_tick = tokio::time::interval(self.settings.interval);
        anchor_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sweep_tick = tokio::time::interval(self.settings.sweep_interval);
        sweep_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "[ic-runtime] ⏱️ Anchoring every {:?} (batch {}, deadline {:?}), sweeping every {:?}",
            self.settings.interval,
            self.settings.batch_size,
            self.settings.run_timeout,
            self.settings.sweep_interval
        );

        loop {
            tokio::select! {
                _ = anchor_tick.tick() => {
                    self.run_once().await;
                }
                _ = sweep_tick.tick() => {
                    self.sweep_once().await;
                }
                _ = shutdown.changed() => {
                    info!("[ic-runtime] Anchoring scheduler shutting down");
                    break;
                }
            }
        }
    }

    /// One bounded submitter run.
    pub async fn run_once(&self) -> Option<RunReport> {
        match self
            .submitter
            .run_with_timeout(self.settings.batch_size, self.settings.run_timeout)
            .await
        {
            Ok(report) if report.is_idle() => {
                debug!("[ic-runtime] Nothing to anchor");
                Some(report)
            }
            Ok(report) => {
                info!(
                    "[ic-runtime] Run: claimed={} anchored={} deduplicated={} retried={} failed={} unfinished={}",
                    report.claimed,
                    report.anchored,
                    report.deduplicated,
                    report.retried,
                    report.failed,
                    report.unfinished
                );
                Some(report)
            }
            Err(e) => {
                error!("[ic-runtime] Anchoring run failed: {}", e);
                None
            }
        }
    }

    /// One stall sweep.
    pub async fn sweep_once(&self) -> usize {
        match self.submitter.sweep_stalled().await {
            Ok(reclaimed) => {
                if !reclaimed.is_empty() {
                    warn!("[ic-runtime] Reclaimed {} stalled entries", reclaimed.len());
                }
                reclaimed.len()
            }
            Err(e) => {
                error!("[ic-runtime] Stall sweep failed: {}", e);
                0
            }
        }
    }
}
