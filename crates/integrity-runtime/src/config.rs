//! # Runtime Configuration
//!
//! Unified configuration for all subsystems and runtime parameters.
//!
//! Every value has a default and can be overridden from `IC_*` environment
//! variables. `validate()` must pass before the runtime starts.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeConfig {
    /// Anchoring queue and scheduler.
    pub anchoring: AnchoringConfig,
    /// Persistence.
    pub storage: StorageConfig,
    /// Ledger connector.
    pub ledger: LedgerConfig,
    /// Logging.
    pub telemetry: TelemetryConfig,
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
    },

    /// A value is outside its allowed range.
    #[error("{field}: {reason}")]
    OutOfRange {
        /// Config field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// RocksDB storage was requested but the binary was built without it.
    #[error("storage backend 'rocksdb' requires the `rocksdb` feature")]
    RocksDbUnavailable,
}

/// Anchoring configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchoringConfig {
    /// Entries claimed per submitter run.
    pub batch_size: usize,
    /// Seconds between submitter runs.
    pub interval_secs: u64,
    /// Deadline for one submitter run in seconds.
    pub run_timeout_secs: u64,
    /// Upper bound for one ledger call in milliseconds.
    pub submit_timeout_ms: u64,
    /// Failed attempts before an entry is dead-lettered.
    pub max_attempts: u32,
    /// Processing claims older than this are reclaimed (seconds).
    pub stall_timeout_secs: u64,
    /// Seconds between stall sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for AnchoringConfig {
    fn default() -> Self {
        Self {
            batch_size: 25,
            interval_secs: 30,
            run_timeout_secs: 20,
            submit_timeout_ms: 10_000,
            max_attempts: 5,
            stall_timeout_secs: 300,
            sweep_interval_secs: 60,
        }
    }
}

impl AnchoringConfig {
    /// Interval between runs.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Deadline for one run.
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    /// Interval between stall sweeps.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Anchor store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local maps; lost on restart.
    Memory,
    /// RocksDB under `data_dir`.
    RocksDb,
}

impl std::str::FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(StorageBackend::Memory),
            "rocksdb" => Ok(StorageBackend::RocksDb),
            _ => Err(()),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Backend for the anchor queue.
    pub backend: StorageBackend,
    /// Data directory for durable backends.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_dir: PathBuf::from("./data"),
        }
    }
}

/// Ledger connector configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    /// Network name recorded on anchors.
    pub network: String,
    /// Simulated confirmation latency in milliseconds.
    pub latency_ms: u64,
    /// Probability in `[0, 1]` that a simulated submission fails.
    pub failure_rate: f64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            network: "simulated".to_string(),
            latency_ms: 50,
            failure_rate: 0.0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Filter directive (trace, debug, info, warn, error, or full EnvFilter syntax).
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

fn parse<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    target: &mut T,
) -> Result<(), ConfigError> {
    if let Some(value) = raw {
        *target = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value })?;
    }
    Ok(())
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl RuntimeConfig {
    /// Loads defaults overridden by environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `IC_BATCH_SIZE`, `IC_ANCHOR_INTERVAL_SECS`, `IC_RUN_TIMEOUT_SECS`
    /// - `IC_SUBMIT_TIMEOUT_MS`, `IC_MAX_ATTEMPTS`, `IC_STALL_TIMEOUT_SECS`, `IC_SWEEP_INTERVAL_SECS`
    /// - `IC_STORAGE_BACKEND` (`memory` | `rocksdb`), `IC_DATA_DIR`
    /// - `IC_LEDGER_NETWORK`, `IC_LEDGER_LATENCY_MS`, `IC_LEDGER_FAILURE_RATE`
    /// - `IC_LOG_LEVEL` or `RUST_LOG`, `IC_JSON_LOGS`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let a = &mut config.anchoring;
        parse("IC_BATCH_SIZE", lookup("IC_BATCH_SIZE"), &mut a.batch_size)?;
        parse("IC_ANCHOR_INTERVAL_SECS", lookup("IC_ANCHOR_INTERVAL_SECS"), &mut a.interval_secs)?;
        parse("IC_RUN_TIMEOUT_SECS", lookup("IC_RUN_TIMEOUT_SECS"), &mut a.run_timeout_secs)?;
        parse("IC_SUBMIT_TIMEOUT_MS", lookup("IC_SUBMIT_TIMEOUT_MS"), &mut a.submit_timeout_ms)?;
        parse("IC_MAX_ATTEMPTS", lookup("IC_MAX_ATTEMPTS"), &mut a.max_attempts)?;
        parse("IC_STALL_TIMEOUT_SECS", lookup("IC_STALL_TIMEOUT_SECS"), &mut a.stall_timeout_secs)?;
        parse("IC_SWEEP_INTERVAL_SECS", lookup("IC_SWEEP_INTERVAL_SECS"), &mut a.sweep_interval_secs)?;

        if let Some(value) = lookup("IC_STORAGE_BACKEND") {
            config.storage.backend = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "IC_STORAGE_BACKEND",
                value,
            })?;
        }
        if let Some(dir) = lookup("IC_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(dir);
        }

        if let Some(network) = lookup("IC_LEDGER_NETWORK") {
            config.ledger.network = network;
        }
        parse("IC_LEDGER_LATENCY_MS", lookup("IC_LEDGER_LATENCY_MS"), &mut config.ledger.latency_ms)?;
        parse(
            "IC_LEDGER_FAILURE_RATE",
            lookup("IC_LEDGER_FAILURE_RATE"),
            &mut config.ledger.failure_rate,
        )?;

        if let Some(level) = lookup("IC_LOG_LEVEL").or_else(|| lookup("RUST_LOG")) {
            config.telemetry.log_level = level;
        }
        if let Some(flag) = lookup("IC_JSON_LOGS") {
            config.telemetry.json_logs = parse_flag(&flag);
        }

        Ok(config)
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.anchoring;
        let out_of_range = |field: &'static str, reason: &str| ConfigError::OutOfRange {
            field,
            reason: reason.to_string(),
        };

        if a.batch_size == 0 {
            return Err(out_of_range("anchoring.batch_size", "must be at least 1"));
        }
        if a.interval_secs == 0 || a.sweep_interval_secs == 0 {
            return Err(out_of_range("anchoring.interval_secs", "intervals must be non-zero"));
        }
        if a.max_attempts == 0 {
            return Err(out_of_range("anchoring.max_attempts", "must be at least 1"));
        }
        if a.stall_timeout_secs <= a.run_timeout_secs {
            return Err(out_of_range(
                "anchoring.stall_timeout_secs",
                "must exceed run_timeout_secs so in-flight runs are not reclaimed",
            ));
        }
        if a.submit_timeout_ms >= a.stall_timeout_secs.saturating_mul(1000) {
            return Err(out_of_range(
                "anchoring.submit_timeout_ms",
                "must be shorter than stall_timeout_secs",
            ));
        }
        if !(0.0..=1.0).contains(&self.ledger.failure_rate) {
            return Err(out_of_range("ledger.failure_rate", "must be within [0, 1]"));
        }
        if self.ledger.network.trim().is_empty() {
            return Err(out_of_range("ledger.network", "must not be empty"));
        }
        if self.storage.backend == StorageBackend::RocksDb && !cfg!(feature = "rocksdb") {
            return Err(ConfigError::RocksDbUnavailable);
        }
        Ok(())
    }
}
