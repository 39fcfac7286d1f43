//! # Outbound Ports
//!
//! The external ledger connector. The submitter is the only component that
//! talks to it.

use crate::domain::LedgerError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// External distributed-ledger connector - outbound port.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Network name recorded on anchors.
    fn network(&self) -> &str;

    /// Submits a hex-encoded hash. Returns the external transaction id.
    async fn submit(&self, hash_hex: &str) -> Result<String, LedgerError>;
}

// =============================================================================
// Mock Implementation for Testing
// =============================================================================

/// Mock ledger for testing.
#[derive(Debug, Default)]
pub struct MockLedger {
    calls: AtomicUsize,
    fail_remaining: AtomicUsize,
    always_fail: AtomicBool,
    delay: Option<Duration>,
    submitted: Mutex<Vec<String>>,
}

impl MockLedger {
    /// Creates a mock that accepts every submission immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock that rejects every submission.
    pub fn failing() -> Self {
        let ledger = Self::default();
        ledger.set_failing(true);
        ledger
    }

    /// Sleeps for `delay` inside each `submit`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fails the next `n` submissions with a network error.
    pub fn fail_next(&self, n: usize) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    /// Toggles permanent failure.
    pub fn set_failing(&self, failing: bool) {
        self.always_fail.store(failing, Ordering::SeqCst);
    }

    /// Number of `submit` calls so far (including failed ones).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Hashes accepted so far, in submission order.
    pub fn submitted_hashes(&self) -> Vec<String> {
        self.submitted.lock().clone()
    }

    fn take_scheduled_failure(&self) -> bool {
        self.fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl Ledger for MockLedger {
    fn network(&self) -> &str {
        "mock"
    }

    async fn submit(&self, hash_hex: &str) -> Result<String, LedgerError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.always_fail.load(Ordering::SeqCst) {
            return Err(LedgerError::Rejected("Mock failure".to_string()));
        }
        if self.take_scheduled_failure() {
            return Err(LedgerError::Network("Mock connection reset".to_string()));
        }
        self.submitted.lock().push(hash_hex.to_string());
        Ok(format!("mock-tx-{n:06}"))
    }
}
