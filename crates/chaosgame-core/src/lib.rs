//! Chaos Game Core — error type and configuration shared by every crate.

pub mod config;
pub mod error;

pub use config::{ChaosGameConfig, DataPaths, WorkflowConfig};
pub use error::{Error, Result};
