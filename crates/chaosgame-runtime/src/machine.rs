//! Workflow state machine.
//!
//! ```text
//! TriggerExperiment -> WaitInterval <-> PollRunStatus -> Decision
//!     -> RecordWin | RecordLoss | Fail -> Terminal
//! ```
//!
//! `transition` is pure: the orchestrator performs the side effect belonging
//! to the current state, turns its outcome into a `WorkflowEvent` and asks
//! for the next state. There is no edge back into a record state.

use chaosgame_fault::{RunStatus, TerminalStatus};

use crate::types::{FailureKind, FailureReason, Terminal, Verdict};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    TriggerExperiment,
    WaitInterval,
    PollRunStatus,
    /// Run settled; waiting on the probe before evaluating.
    Decision(TerminalStatus),
    RecordWin,
    RecordLoss,
    Fail(FailureReason),
    Terminal(Terminal),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    Launched,
    LaunchFailed(FailureReason),
    IntervalElapsed,
    StatusObserved(RunStatus),
    PollFailed(FailureReason),
    Evaluated(Verdict),
    ScoreRecorded,
    RecordFailed(FailureReason),
    FailureReported,
    TimedOut,
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TriggerExperiment => "TriggerExperiment",
            Self::WaitInterval => "WaitInterval",
            Self::PollRunStatus => "PollRunStatus",
            Self::Decision(_) => "Decision",
            Self::RecordWin => "RecordWin",
            Self::RecordLoss => "RecordLoss",
            Self::Fail(_) => "Fail",
            Self::Terminal(Terminal::Success { .. }) => "Success",
            Self::Terminal(Terminal::Failure { .. }) => "Failure",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }
}

pub fn transition(state: &WorkflowState, event: WorkflowEvent) -> WorkflowState {
    use WorkflowEvent as E;
    use WorkflowState as S;

    match (state, event) {
        (S::Terminal(_), _) => state.clone(),
        (S::Fail(reason), E::FailureReported) => S::Terminal(Terminal::Failure {
            reason: reason.clone(),
        }),
        (S::Fail(_), _) => state.clone(),
        (_, E::TimedOut) => S::Fail(FailureReason::new(
            FailureKind::Timeout,
            "workflow timeout elapsed before the run settled",
        )),

        (S::TriggerExperiment, E::Launched) => S::WaitInterval,
        (S::TriggerExperiment, E::LaunchFailed(reason)) => S::Fail(reason),

        (S::WaitInterval, E::IntervalElapsed) => S::PollRunStatus,

        (S::PollRunStatus, E::StatusObserved(status)) => match status.terminal() {
            Some(terminal) => S::Decision(terminal),
            None => S::WaitInterval,
        },
        (S::PollRunStatus, E::PollFailed(reason)) => S::Fail(reason),

        (S::Decision(_), E::Evaluated(Verdict::Win)) => S::RecordWin,
        (S::Decision(_), E::Evaluated(Verdict::Loss)) => S::RecordLoss,
        (S::Decision(status), E::Evaluated(Verdict::Error)) => S::Fail(FailureReason::new(
            FailureKind::ExperimentFailed,
            format!("fault-injection run ended {}", RunStatus::from(*status)),
        )),

        (S::RecordWin, E::ScoreRecorded) => S::Terminal(Terminal::Success {
            verdict: Verdict::Win,
        }),
        (S::RecordLoss, E::ScoreRecorded) => S::Terminal(Terminal::Success {
            verdict: Verdict::Loss,
        }),
        (S::RecordWin | S::RecordLoss, E::RecordFailed(reason)) => S::Fail(reason),

        (state, event) => S::Fail(FailureReason::new(
            FailureKind::Internal,
            format!("unexpected event {:?} in state {}", event, state.name()),
        )),
    }
}
