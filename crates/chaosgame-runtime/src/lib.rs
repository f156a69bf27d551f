//! Runtime orchestrator — drives one chaos experiment from launch to score.
//!
//! The orchestrator starts a fault-injection run, probes the target's health
//! while the fault is active, polls the run until it settles, folds both
//! signals into a verdict and records it as a single atomic score increment.

pub mod evaluator;
pub mod launcher;
pub mod machine;
pub mod orchestrator;
pub mod poller;
pub mod prober;
pub mod recorder;
pub mod types;

pub use evaluator::evaluate;
pub use launcher::ExperimentLauncher;
pub use machine::{transition, WorkflowEvent, WorkflowState};
pub use orchestrator::Orchestrator;
pub use poller::StatusPoller;
pub use prober::{HealthCheck, HealthProber, HttpHealthCheck, ProbePolicy};
pub use recorder::ScoreRecorder;
pub use types::*;
