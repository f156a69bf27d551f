//! Run status polling. One status read per cycle, mirrored into the run.

use std::sync::Arc;

use tracing::{debug, warn};

use chaosgame_core::{Error, Result};
use chaosgame_fault::{ExperimentRun, FaultBackend, RunStatus};

pub struct StatusPoller {
    backend: Arc<dyn FaultBackend>,
    error_budget: u32,
    consecutive_errors: u32,
    cycles: u32,
}

impl StatusPoller {
    /// `error_budget` is the number of consecutive failed reads tolerated;
    /// zero makes the first failure fatal.
    pub fn new(backend: Arc<dyn FaultBackend>, error_budget: u32) -> Self {
        Self {
            backend,
            error_budget,
            consecutive_errors: 0,
            cycles: 0,
        }
    }

    /// Status reads performed so far, failed ones included.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Read the run's status once and return the status the run now holds.
    ///
    /// A tolerated read failure returns the previously held status.
    pub async fn poll(&mut self, run: &mut ExperimentRun) -> Result<RunStatus> {
        self.cycles += 1;
        match self.backend.get_run_status(&run.run_id).await {
            Ok(status) => {
                self.consecutive_errors = 0;
                let held = run.observe(status);
                debug!("Poll cycle {}: run {} is {}", self.cycles, run.run_id, held);
                Ok(held)
            }
            Err(e) => {
                self.consecutive_errors += 1;
                if self.consecutive_errors > self.error_budget {
                    return Err(match e {
                        Error::Poll(_) => e,
                        other => Error::Poll(other.to_string()),
                    });
                }
                warn!(
                    "Status read {} for run {} failed ({}/{} tolerated): {}",
                    self.cycles, run.run_id, self.consecutive_errors, self.error_budget, e
                );
                Ok(run.status())
            }
        }
    }
}
