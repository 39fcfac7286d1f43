//! # Ports Layer - Anchor Queue Subsystem
//!
//! - `inbound`: `AnchorQueueApi` (driving port)
//! - `outbound`: `AnchorStore` (driven port)

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
