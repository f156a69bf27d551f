//! Drives the workflow state machine against real collaborators.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, warn};

use chaosgame_core::WorkflowConfig;
use chaosgame_fault::{ExperimentRun, FaultBackend};
use chaosgame_store::ScoreStore;

use crate::evaluator::evaluate;
use crate::launcher::ExperimentLauncher;
use crate::machine::{transition, WorkflowEvent, WorkflowState};
use crate::poller::StatusPoller;
use crate::prober::{HealthCheck, HealthProber, ProbePolicy};
use crate::recorder::ScoreRecorder;
use crate::types::*;

/// Runs one chaos experiment at a time from launch to recorded score.
pub struct Orchestrator {
    backend: Arc<dyn FaultBackend>,
    health: Arc<dyn HealthCheck>,
    recorder: ScoreRecorder,
    config: WorkflowConfig,
}

impl Orchestrator {
    pub fn new(
        backend: Arc<dyn FaultBackend>,
        health: Arc<dyn HealthCheck>,
        store: Arc<dyn ScoreStore>,
        score_key: impl Into<String>,
        config: WorkflowConfig,
    ) -> Self {
        info!(
            "Orchestrator initialized: poll_interval={:?}, probe_attempts={}, timeout={:?}",
            config.poll_interval(),
            config.probe_max_attempts,
            config.workflow_timeout()
        );
        Self {
            backend,
            health,
            recorder: ScoreRecorder::new(store, score_key),
            config,
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Run one experiment for the templates tagged `tag`.
    ///
    /// Every suspension point before the record step shares one deadline, so
    /// the run ends within the workflow timeout. The record step itself is a
    /// single atomic add and is never cut short, so a timeout cannot leave a
    /// half-applied score.
    pub async fn run(&self, tag: &str) -> RunReport {
        let started_at = chrono::Utc::now();
        let deadline = Instant::now() + self.config.workflow_timeout();
        let launcher = ExperimentLauncher::new(self.backend.clone());
        let mut poller = StatusPoller::new(self.backend.clone(), self.config.poll_error_budget);

        let mut state = WorkflowState::TriggerExperiment;
        let mut run: Option<ExperimentRun> = None;
        let mut probe_task: Option<JoinHandle<HealthProbeResult>> = None;
        let mut probe: Option<HealthProbeResult> = None;
        let mut verdict: Option<Verdict> = None;

        info!("Starting chaos experiment for tag {}", tag);

        let terminal = loop {
            let event = match &state {
                WorkflowState::TriggerExperiment => {
                    match timeout_at(deadline, launcher.launch(tag)).await {
                        Err(_) => WorkflowEvent::TimedOut,
                        Ok(Ok(launched)) => {
                            probe_task = Some(self.spawn_probe());
                            run = Some(launched);
                            WorkflowEvent::Launched
                        }
                        Ok(Err(e)) => WorkflowEvent::LaunchFailed(FailureReason::from_error(&e)),
                    }
                }
                WorkflowState::WaitInterval => {
                    match timeout_at(deadline, tokio::time::sleep(self.config.poll_interval())).await {
                        Err(_) => WorkflowEvent::TimedOut,
                        Ok(()) => WorkflowEvent::IntervalElapsed,
                    }
                }
                WorkflowState::PollRunStatus => match run.as_mut() {
                    Some(current) => match timeout_at(deadline, poller.poll(current)).await {
                        Err(_) => WorkflowEvent::TimedOut,
                        Ok(Ok(status)) => WorkflowEvent::StatusObserved(status),
                        Ok(Err(e)) => WorkflowEvent::PollFailed(FailureReason::from_error(&e)),
                    },
                    None => WorkflowEvent::PollFailed(FailureReason::new(
                        FailureKind::Internal,
                        "status poll without a launched run",
                    )),
                },
                WorkflowState::Decision(status) => {
                    let status = *status;
                    match self.join_probe(&mut probe_task, deadline).await {
                        Some(result) => {
                            let v = evaluate(status, result.succeeded);
                            info!(
                                "Decision: status={:?}, probe_succeeded={} after {} attempt(s) -> {}",
                                status, result.succeeded, result.attempts, v
                            );
                            probe = Some(result);
                            verdict = Some(v);
                            WorkflowEvent::Evaluated(v)
                        }
                        None => WorkflowEvent::TimedOut,
                    }
                }
                WorkflowState::RecordWin | WorkflowState::RecordLoss => {
                    let v = if state == WorkflowState::RecordWin {
                        Verdict::Win
                    } else {
                        Verdict::Loss
                    };
                    match self.recorder.record(v).await {
                        Ok(_) => WorkflowEvent::ScoreRecorded,
                        Err(e) => WorkflowEvent::RecordFailed(FailureReason::from_error(&e)),
                    }
                }
                WorkflowState::Fail(reason) => {
                    if let Some(task) = probe_task.take() {
                        task.abort();
                    }
                    error!("Chaos experiment failed: {}", reason);
                    WorkflowEvent::FailureReported
                }
                WorkflowState::Terminal(terminal) => break terminal.clone(),
            };

            let next = transition(&state, event);
            debug!("Workflow transition: {} -> {}", state.name(), next.name());
            state = next;
        };

        if let Terminal::Success { verdict } = &terminal {
            info!("Chaos experiment finished: {}", verdict);
        }

        RunReport {
            tag: tag.to_string(),
            final_status: run.as_ref().map(|r| r.status()),
            run,
            probe,
            poll_cycles: poller.cycles(),
            verdict,
            terminal,
            started_at,
            finished_at: chrono::Utc::now(),
        }
    }

    fn spawn_probe(&self) -> JoinHandle<HealthProbeResult> {
        let prober = HealthProber::new(self.health.clone(), ProbePolicy::from_config(&self.config));
        tokio::spawn(async move { prober.probe().await })
    }

    /// Wait for the probe phase to conclude. A panicked or missing probe
    /// counts as a failed probe; `None` means the deadline passed first.
    async fn join_probe(
        &self,
        task: &mut Option<JoinHandle<HealthProbeResult>>,
        deadline: Instant,
    ) -> Option<HealthProbeResult> {
        let Some(handle) = task.as_mut() else {
            return Some(HealthProbeResult::failed(0, "probe was never started"));
        };

        let joined = match timeout_at(deadline, handle).await {
            Err(_) => return None,
            Ok(joined) => joined,
        };
        task.take();

        Some(match joined {
            Ok(result) => result,
            Err(e) => {
                warn!("Probe task did not complete: {}", e);
                HealthProbeResult::failed(0, format!("probe task aborted: {}", e))
            }
        })
    }
}
