//! Fault-injection run types.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use chaosgame_core::Error;

/// Remote status of a fault-injection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Initiating,
    Pending,
    Running,
    Stopping,
    Stopped,
    Completed,
    Failed,
}

/// Statuses the decision step acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminalStatus {
    Completed,
    Failed,
    Stopping,
    Stopped,
}

impl RunStatus {
    pub fn all() -> &'static [RunStatus] {
        &[
            Self::Initiating,
            Self::Pending,
            Self::Running,
            Self::Stopping,
            Self::Stopped,
            Self::Completed,
            Self::Failed,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Initiating => "initiating",
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// `Some` for statuses the poller stops on. `stopping` counts: the run has been halted.
    pub fn terminal(&self) -> Option<TerminalStatus> {
        match self {
            Self::Initiating | Self::Pending | Self::Running => None,
            Self::Stopping => Some(TerminalStatus::Stopping),
            Self::Stopped => Some(TerminalStatus::Stopped),
            Self::Completed => Some(TerminalStatus::Completed),
            Self::Failed => Some(TerminalStatus::Failed),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal().is_some()
    }

    /// Progress order. Final statuses share the top rank.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Initiating => 0,
            Self::Pending => 1,
            Self::Running => 2,
            Self::Stopping => 3,
            Self::Stopped | Self::Completed | Self::Failed => 4,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RunStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|status| status.name() == lowered)
            .ok_or_else(|| Error::Poll(format!("unrecognized run status: {}", s)))
    }
}

impl From<TerminalStatus> for RunStatus {
    fn from(status: TerminalStatus) -> Self {
        match status {
            TerminalStatus::Completed => Self::Completed,
            TerminalStatus::Failed => Self::Failed,
            TerminalStatus::Stopping => Self::Stopping,
            TerminalStatus::Stopped => Self::Stopped,
        }
    }
}

/// A fault template registered with the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentTemplate {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

/// One fault-injection execution, mirroring the backend's view of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExperimentRun {
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(rename = "templateId")]
    pub template_id: String,
    status: RunStatus,
}

impl ExperimentRun {
    pub fn new(run_id: impl Into<String>, template_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            template_id: template_id.into(),
            status: RunStatus::Initiating,
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Mirror a freshly read remote status. Reads that would move the run
    /// backwards are ignored. Returns the status now held.
    pub fn observe(&mut self, status: RunStatus) -> RunStatus {
        if status.rank() < self.status.rank() || (self.status.rank() == 4 && status != self.status) {
            warn!(
                "Ignoring status regression for run {}: {} -> {}",
                self.run_id, self.status, status
            );
        } else {
            self.status = status;
        }
        self.status
    }
}
