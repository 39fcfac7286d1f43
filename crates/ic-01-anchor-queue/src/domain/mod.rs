//! # Domain Layer - Anchor Queue Subsystem
//!
//! Pure business logic for the anchoring state machine.
//!
//! ## Components
//!
//! - `entities`: `AnchorQueueEntry`, `AnchorStatus`, `AnchorRecord`, `AnchorQueueConfig`
//! - `value_objects`: `EnqueueOutcome`, `ClaimToken`, `QueueStatus`
//! - `errors`: `AnchorQueueError` enumeration

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use value_objects::*;
