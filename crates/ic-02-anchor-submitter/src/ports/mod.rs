//! Ports for the Anchor Submitter subsystem.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
