//! Simulated distributed-ledger connector.
//!
//! Stands in for a real chain client: waits a configurable confirmation
//! latency, fails at a configurable rate, and returns a deterministic
//! transaction id derived from the submitted hash and a sequence number.

use async_trait::async_trait;
use ic_02_anchor_submitter::{Ledger, LedgerError};
use rand::Rng;
use shared_crypto::sha256;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::config::LedgerConfig;

/// Ledger adapter used until a production chain client is configured.
#[derive(Debug)]
pub struct SimulatedLedger {
    network: String,
    latency: Duration,
    failure_rate: f64,
    sequence: AtomicU64,
}

impl SimulatedLedger {
    /// Builds the adapter from ledger configuration.
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            network: config.network.clone(),
            latency: Duration::from_millis(config.latency_ms),
            failure_rate: config.failure_rate.clamp(0.0, 1.0),
            sequence: AtomicU64::new(0),
        }
    }

    /// Submissions accepted so far.
    pub fn accepted(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    fn tx_id(&self, hash_hex: &str, seq: u64) -> String {
        let mut material = Vec::with_capacity(hash_hex.len() + self.network.len() + 8);
        material.extend_from_slice(self.network.as_bytes());
        material.extend_from_slice(hash_hex.as_bytes());
        material.extend_from_slice(&seq.to_be_bytes());
        format!("0x{}", hex::encode(sha256(&material)))
    }
}

#[async_trait]
impl Ledger for SimulatedLedger {
    fn network(&self) -> &str {
        &self.network
    }

    async fn submit(&self, hash_hex: &str) -> Result<String, LedgerError> {
        let fail = self.failure_rate > 0.0 && rand::thread_rng().gen_bool(self.failure_rate);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if fail {
            return Err(LedgerError::Network(format!(
                "simulated outage on {}",
                self.network
            )));
        }

        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let tx_id = self.tx_id(hash_hex, seq);
        debug!("[ic-runtime] simulated ledger confirmed {} as {}", hash_hex, tx_id);
        Ok(tx_id)
    }
}
