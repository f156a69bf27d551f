//! Runtime types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use chaosgame_core::Error;
use chaosgame_fault::{ExperimentRun, RunStatus};
use chaosgame_store::ScoreField;

/// Outcome of probing the target while the fault is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthProbeResult {
    /// Attempts made, never above the configured budget.
    pub attempts: u32,
    /// Whether the target answered healthy within the budget.
    pub succeeded: bool,
    #[serde(rename = "lastError", skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl HealthProbeResult {
    pub fn healthy(attempts: u32) -> Self {
        Self {
            attempts,
            succeeded: true,
            last_error: None,
        }
    }

    pub fn failed(attempts: u32, error: impl Into<String>) -> Self {
        Self {
            attempts,
            succeeded: false,
            last_error: Some(error.into()),
        }
    }
}

/// Reconciled result of one experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Win,
    Loss,
    Error,
}

impl Verdict {
    /// Counter a verdict increments. `Error` leaves the score alone.
    pub fn score_field(&self) -> Option<ScoreField> {
        match self {
            Self::Win => Some(ScoreField::Won),
            Self::Loss => Some(ScoreField::Lost),
            Self::Error => None,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Win => write!(f, "win"),
            Self::Loss => write!(f, "loss"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Why a run ended in failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Launch,
    Poll,
    Timeout,
    ExperimentFailed,
    Persistence,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReason {
    pub kind: FailureKind,
    pub message: String,
}

impl FailureReason {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn from_error(err: &Error) -> Self {
        let kind = match err {
            Error::NoTemplateFound(_) | Error::LaunchRejected(_) => FailureKind::Launch,
            Error::Poll(_) => FailureKind::Poll,
            Error::WorkflowTimeout(_) => FailureKind::Timeout,
            Error::Persistence(_) | Error::Database(_) => FailureKind::Persistence,
            _ => FailureKind::Internal,
        };
        Self::new(kind, err.to_string())
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum Terminal {
    /// Verdict recorded in the score.
    Success { verdict: Verdict },
    /// Nothing recorded.
    Failure { reason: FailureReason },
}

/// Everything observed during one orchestration run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<ExperimentRun>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_status: Option<RunStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe: Option<HealthProbeResult>,
    pub poll_cycles: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    pub terminal: Terminal,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        matches!(self.terminal, Terminal::Success { .. })
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match &self.terminal {
            Terminal::Failure { reason } => Some(reason),
            Terminal::Success { .. } => None,
        }
    }
}
