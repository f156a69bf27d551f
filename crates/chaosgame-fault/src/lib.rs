//! Chaos Game Fault — the fault-injection backend as seen by the orchestrator.
//!
//! The orchestrator needs three calls: list templates by tag, start a run,
//! and read a run's status. `FaultBackend` is that contract; `HttpFaultBackend`
//! speaks it over HTTP.

pub mod backend;
pub mod http;
pub mod types;

pub use backend::FaultBackend;
pub use http::HttpFaultBackend;
pub use types::*;
