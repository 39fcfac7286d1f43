//! Adapters for the Consent & Revocation subsystem.

pub mod memory;

pub use memory::InMemoryConsentStore;
