//! Runtime adapters for the subsystem ports.

pub mod ledger;
pub mod storage;

pub use ledger::SimulatedLedger;
