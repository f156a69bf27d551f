//! End-to-end orchestration scenarios against scripted collaborators.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chaosgame_core::{Error, Result, WorkflowConfig};
use chaosgame_fault::{ExperimentTemplate, FaultBackend, RunStatus};
use chaosgame_runtime::{FailureKind, HealthCheck, Orchestrator, Terminal, Verdict};
use chaosgame_store::{MemoryScoreStore, ScoreField, ScoreRecord, ScoreStore, SqliteScoreStore};

/// Fault backend replaying a status script; the last status repeats forever.
struct ScriptedBackend {
    templates: Vec<String>,
    statuses: Mutex<VecDeque<RunStatus>>,
    reject_start: bool,
    fail_polls: bool,
    starts: AtomicU32,
    polls: AtomicU32,
}

impl ScriptedBackend {
    fn new(statuses: &[RunStatus]) -> Self {
        Self {
            templates: vec!["EXTstopall".into()],
            statuses: Mutex::new(statuses.iter().copied().collect()),
            reject_start: false,
            fail_polls: false,
            starts: AtomicU32::new(0),
            polls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl FaultBackend for ScriptedBackend {
    async fn list_templates(&self, tag: &str) -> Result<Vec<ExperimentTemplate>> {
        Ok(self
            .templates
            .iter()
            .map(|id| ExperimentTemplate {
                id: id.clone(),
                description: format!("stop tasks for {}", tag),
                tags: [("Project".to_string(), tag.to_string())].into_iter().collect(),
            })
            .collect())
    }

    async fn start_run(&self, template_id: &str, _tag: &str) -> Result<String> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.reject_start {
            return Err(Error::LaunchRejected("an experiment is already running".into()));
        }
        Ok(format!("EXP-{}", template_id))
    }

    async fn get_run_status(&self, _run_id: &str) -> Result<RunStatus> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        if self.fail_polls {
            return Err(Error::Poll("connection reset by peer".into()));
        }
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            Ok(statuses.pop_front().unwrap())
        } else {
            Ok(*statuses.front().unwrap())
        }
    }
}

/// Health endpoint that turns healthy from the given attempt on. `0` never does.
struct ScriptedHealth {
    healthy_from: u32,
    calls: AtomicU32,
}

impl ScriptedHealth {
    fn new(healthy_from: u32) -> Arc<Self> {
        Arc::new(Self {
            healthy_from,
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl HealthCheck for ScriptedHealth {
    async fn check(&self) -> Result<u16> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.healthy_from != 0 && call >= self.healthy_from {
            Ok(200)
        } else {
            Err(Error::Probe("unhealthy: HTTP 502".into()))
        }
    }
}

struct BrokenStore;

impl ScoreStore for BrokenStore {
    fn increment(&self, _key: &str, _field: ScoreField) -> Result<()> {
        Err(Error::Persistence("table is read-only".into()))
    }

    fn get_score(&self, _key: &str) -> Result<ScoreRecord> {
        Ok(ScoreRecord::default())
    }
}

fn fast_config() -> WorkflowConfig {
    WorkflowConfig {
        poll_interval_ms: 10,
        probe_max_attempts: 5,
        probe_attempt_timeout_ms: 100,
        probe_delay_ms: 1,
        probe_start_delay_ms: 0,
        workflow_timeout_ms: 10_000,
        poll_error_budget: 0,
    }
}

#[tokio::test]
async fn scenario_a_completed_and_healthy_is_a_win() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteScoreStore::open(dir.path()).unwrap());
    let backend = Arc::new(ScriptedBackend::new(&[
        RunStatus::Initiating,
        RunStatus::Running,
        RunStatus::Completed,
    ]));
    let health = ScriptedHealth::new(1);
    let orch = Orchestrator::new(backend.clone(), health.clone(), store.clone(), "score", fast_config());

    let report = orch.run("chaos-game").await;

    assert_eq!(report.terminal, Terminal::Success { verdict: Verdict::Win });
    assert_eq!(report.final_status, Some(RunStatus::Completed));
    assert_eq!(report.poll_cycles, 3);
    let probe = report.probe.as_ref().unwrap();
    assert!(probe.succeeded);
    assert_eq!(probe.attempts, 1);
    assert_eq!(health.calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.run.as_ref().unwrap().template_id, "EXTstopall");
    assert_eq!(backend.starts.load(Ordering::SeqCst), 1);
    assert_eq!(store.get_score("score").unwrap(), ScoreRecord { won: 1, lost: 0 });
}

#[tokio::test]
async fn scenario_b_stopped_run_is_a_loss_regardless_of_probe() {
    for healthy_from in [1, 0] {
        let store = Arc::new(MemoryScoreStore::new());
        let backend = Arc::new(ScriptedBackend::new(&[RunStatus::Running, RunStatus::Stopped]));
        let orch = Orchestrator::new(
            backend,
            ScriptedHealth::new(healthy_from),
            store.clone(),
            "score",
            fast_config(),
        );

        let report = orch.run("chaos-game").await;

        assert_eq!(report.verdict, Some(Verdict::Loss));
        assert!(report.is_success());
        assert_eq!(store.get_score("score").unwrap(), ScoreRecord { won: 0, lost: 1 });
    }
}

#[tokio::test]
async fn scenario_c_no_template_is_a_launch_failure() {
    let store = Arc::new(MemoryScoreStore::new());
    let mut backend = ScriptedBackend::new(&[RunStatus::Completed]);
    backend.templates.clear();
    let backend = Arc::new(backend);
    let health = ScriptedHealth::new(1);
    let orch = Orchestrator::new(backend.clone(), health.clone(), store.clone(), "score", fast_config());

    let report = orch.run("chaos-game").await;

    let reason = report.failure().expect("launch should fail");
    assert_eq!(reason.kind, FailureKind::Launch);
    assert!(reason.message.contains("chaos-game"));
    assert!(report.run.is_none());
    assert!(report.verdict.is_none());
    assert_eq!(report.poll_cycles, 0);
    assert_eq!(backend.starts.load(Ordering::SeqCst), 0);
    assert_eq!(health.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.get_score("score").unwrap(), ScoreRecord::default());
}

#[tokio::test]
async fn scenario_d_completed_but_probe_exhausted_is_a_loss() {
    let store = Arc::new(MemoryScoreStore::new());
    let backend = Arc::new(ScriptedBackend::new(&[RunStatus::Running, RunStatus::Completed]));
    let health = ScriptedHealth::new(0);
    let orch = Orchestrator::new(backend, health.clone(), store.clone(), "score", fast_config());

    let report = orch.run("chaos-game").await;

    assert_eq!(report.terminal, Terminal::Success { verdict: Verdict::Loss });
    let probe = report.probe.as_ref().unwrap();
    assert!(!probe.succeeded);
    assert_eq!(probe.attempts, 5);
    assert!(probe.last_error.as_deref().unwrap().contains("502"));
    assert_eq!(health.calls.load(Ordering::SeqCst), 5);
    assert_eq!(store.get_score("score").unwrap(), ScoreRecord { won: 0, lost: 1 });
}

#[tokio::test]
async fn launch_rejection_is_not_retried() {
    let store = Arc::new(MemoryScoreStore::new());
    let mut backend = ScriptedBackend::new(&[RunStatus::Completed]);
    backend.reject_start = true;
    let backend = Arc::new(backend);
    let orch = Orchestrator::new(backend.clone(), ScriptedHealth::new(1), store.clone(), "score", fast_config());

    let report = orch.run("chaos-game").await;

    assert_eq!(report.failure().unwrap().kind, FailureKind::Launch);
    assert_eq!(backend.starts.load(Ordering::SeqCst), 1);
    assert_eq!(store.get_score("score").unwrap(), ScoreRecord::default());
}

#[tokio::test]
async fn poll_error_is_fatal_and_scores_nothing() {
    let store = Arc::new(MemoryScoreStore::new());
    let mut backend = ScriptedBackend::new(&[RunStatus::Running]);
    backend.fail_polls = true;
    let orch = Orchestrator::new(Arc::new(backend), ScriptedHealth::new(1), store.clone(), "score", fast_config());

    let report = orch.run("chaos-game").await;

    assert_eq!(report.failure().unwrap().kind, FailureKind::Poll);
    assert_eq!(report.poll_cycles, 1);
    assert!(report.verdict.is_none());
    assert_eq!(store.get_score("score").unwrap(), ScoreRecord::default());
}

#[tokio::test]
async fn persistence_failure_is_distinct_from_loss() {
    let backend = Arc::new(ScriptedBackend::new(&[RunStatus::Completed]));
    let orch = Orchestrator::new(backend, ScriptedHealth::new(1), Arc::new(BrokenStore), "score", fast_config());

    let report = orch.run("chaos-game").await;

    assert_eq!(report.verdict, Some(Verdict::Win));
    assert_eq!(report.failure().unwrap().kind, FailureKind::Persistence);
}

#[tokio::test(start_paused = true)]
async fn never_settling_run_times_out_within_bound() {
    let store = Arc::new(MemoryScoreStore::new());
    let backend = Arc::new(ScriptedBackend::new(&[RunStatus::Running]));
    let config = WorkflowConfig {
        poll_interval_ms: 5_000,
        workflow_timeout_ms: 60_000,
        probe_start_delay_ms: 5_000,
        ..fast_config()
    };
    let poll_interval = config.poll_interval();
    let timeout = config.workflow_timeout();
    let orch = Orchestrator::new(backend.clone(), ScriptedHealth::new(1), store.clone(), "score", config);

    let started = tokio::time::Instant::now();
    let report = orch.run("chaos-game").await;
    let elapsed = started.elapsed();

    assert_eq!(report.failure().unwrap().kind, FailureKind::Timeout);
    assert!(elapsed >= timeout, "ended early after {:?}", elapsed);
    assert!(elapsed <= timeout + poll_interval, "overran: {:?}", elapsed);
    assert_eq!(report.final_status, Some(RunStatus::Running));
    assert!(backend.polls.load(Ordering::SeqCst) >= 10);
    assert!(report.verdict.is_none());
    assert_eq!(store.get_score("score").unwrap(), ScoreRecord::default());
}

#[tokio::test(start_paused = true)]
async fn slow_probe_is_joined_before_deciding() {
    let store = Arc::new(MemoryScoreStore::new());
    let backend = Arc::new(ScriptedBackend::new(&[RunStatus::Completed]));
    let health = ScriptedHealth::new(4);
    let config = WorkflowConfig {
        probe_delay_ms: 2_000,
        ..fast_config()
    };
    let orch = Orchestrator::new(backend, health.clone(), store.clone(), "score", config);

    let started = tokio::time::Instant::now();
    let report = orch.run("chaos-game").await;

    // the run settles on the first poll, the probe needs three delays
    assert!(started.elapsed() >= Duration::from_secs(6));
    assert_eq!(report.verdict, Some(Verdict::Win));
    assert_eq!(report.probe.unwrap().attempts, 4);
    assert_eq!(store.get_score("score").unwrap(), ScoreRecord { won: 1, lost: 0 });
}

#[tokio::test]
async fn consecutive_runs_accumulate_score() {
    let store = Arc::new(MemoryScoreStore::new());

    for statuses in [
        vec![RunStatus::Completed],
        vec![RunStatus::Stopping],
        vec![RunStatus::Failed],
        vec![RunStatus::Completed],
    ] {
        let backend = Arc::new(ScriptedBackend::new(&statuses));
        let orch = Orchestrator::new(backend, ScriptedHealth::new(1), store.clone(), "score", fast_config());
        orch.run("chaos-game").await;
    }

    let score = store.get_score("score").unwrap();
    assert_eq!(score, ScoreRecord { won: 2, lost: 1 });
    assert_eq!(score.total(), 3);
}
