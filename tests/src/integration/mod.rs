//! Cross-subsystem integration flows.

pub mod anchoring_flows;
pub mod audit_flows;
pub mod consent_flows;
pub mod e2e_pipeline;
