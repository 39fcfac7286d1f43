//! Anchor store backends.
//!
//! The in-memory store lives in `ic-01-anchor-queue`; RocksDB is opt-in via
//! the `rocksdb` feature.

#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;

#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{RocksDbAnchorStore, RocksDbConfig};
