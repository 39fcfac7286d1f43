//! # Dependency Injection Container
//!
//! Builds every subsystem with its adapters and hands out shared handles.

pub mod subsystems;

pub use subsystems::{ContainerError, IntegrityContainer};
