//! Shared application state.

use std::collections::HashMap;
use std::sync::Arc;

use chaosgame_core::ChaosGameConfig;
use chaosgame_runtime::{Orchestrator, RunReport};
use chaosgame_store::ScoreStore;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc;

/// A triggered experiment run, as seen by API clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunJob {
    pub id: String,
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub status: RunJobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<RunReport>,
    pub queued_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunJobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl RunJobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// A request for the worker to run one experiment.
pub struct RunRequest {
    pub job_id: String,
    pub tag: String,
}

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: ChaosGameConfig,
    pub store: Arc<dyn ScoreStore>,
    pub orchestrator: Arc<Orchestrator>,
    pub runs: RwLock<HashMap<String, RunJob>>,
    pub run_tx: mpsc::UnboundedSender<RunRequest>,
    run_rx: parking_lot::Mutex<Option<mpsc::UnboundedReceiver<RunRequest>>>,
}

impl AppState {
    pub fn new(config: ChaosGameConfig, store: Arc<dyn ScoreStore>, orchestrator: Orchestrator) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            config,
            store,
            orchestrator: Arc::new(orchestrator),
            runs: RwLock::new(HashMap::new()),
            run_tx: tx,
            run_rx: parking_lot::Mutex::new(Some(rx)),
        }
    }

    /// Take the run receiver (can only be called once, by the worker).
    pub fn take_run_rx(&self) -> Option<mpsc::UnboundedReceiver<RunRequest>> {
        self.run_rx.lock().take()
    }

    /// Record a queued job and hand it to the worker.
    pub fn enqueue(&self, tag: String, source: Option<String>) -> Option<RunJob> {
        let job = RunJob {
            id: uuid::Uuid::new_v4().to_string(),
            tag: tag.clone(),
            source,
            status: RunJobStatus::Queued,
            report: None,
            queued_at: now_millis(),
            started_at: None,
            completed_at: None,
        };
        self.runs.write().insert(job.id.clone(), job.clone());

        let request = RunRequest {
            job_id: job.id.clone(),
            tag,
        };
        if self.run_tx.send(request).is_err() {
            self.runs.write().remove(&job.id);
            return None;
        }
        Some(job)
    }
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
