//! Adapters for the Audit Export subsystem.

pub mod memory;

pub use memory::InMemoryAuditStore;
