//! Outcome evaluation.

use chaosgame_fault::TerminalStatus;

use crate::types::Verdict;

/// Fold the settled run status and the probe outcome into a verdict.
///
/// A completed run with a healthy target is a win. A halted run is a loss
/// whatever the probe saw, since halting means the target's own alarm fired.
/// A failed run says nothing about the target and yields `Error`.
pub fn evaluate(status: TerminalStatus, probe_succeeded: bool) -> Verdict {
    match (status, probe_succeeded) {
        (TerminalStatus::Completed, true) => Verdict::Win,
        (TerminalStatus::Completed, false) => Verdict::Loss,
        (TerminalStatus::Stopping | TerminalStatus::Stopped, _) => Verdict::Loss,
        (TerminalStatus::Failed, _) => Verdict::Error,
    }
}
