//! Chaos Game server — HTTP trigger surface over the experiment orchestrator.

pub mod routes;
pub mod state;
pub mod worker;

pub use routes::build_router;
pub use state::{AppState, RunJob, RunJobStatus, RunRequest};
pub use worker::start_run_worker;
