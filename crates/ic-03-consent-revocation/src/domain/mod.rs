//! # Domain Layer - Consent & Revocation Subsystem
//!
//! - `entities`: `ConsentRecord`, `RevocationEvent`, `ConsentGrant`
//! - `errors`: `RevocationError`

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
