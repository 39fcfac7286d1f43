//! Ports for the Audit Export subsystem.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
