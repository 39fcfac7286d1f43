//! Adapters for the Anchor Queue subsystem.

pub mod memory;

pub use memory::InMemoryAnchorStore;
