//! Ports for the Consent & Revocation subsystem.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
