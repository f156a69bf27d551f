//! Configuration and data directory management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Paths to the chaos game data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Score database directory (`data/scoredb/`).
    pub scoredb: PathBuf,
    /// Workflow tuning file (`data/workflow.json`).
    pub workflow_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            scoredb: root.join("scoredb"),
            workflow_file: root.join("workflow.json"),
            root,
        };
        std::fs::create_dir_all(&paths.scoredb)?;
        Ok(paths)
    }
}

/// Timing and retry knobs for one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Wait between two run status reads.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Health probe attempt budget.
    #[serde(default = "default_probe_max_attempts")]
    pub probe_max_attempts: u32,
    /// Upper bound on a single health probe attempt.
    #[serde(default = "default_probe_attempt_timeout_ms")]
    pub probe_attempt_timeout_ms: u64,
    /// Wait between two failed health probe attempts.
    #[serde(default = "default_probe_delay_ms")]
    pub probe_delay_ms: u64,
    /// Wait after launch before the first probe, so the fault has time to land.
    #[serde(default = "default_probe_start_delay_ms")]
    pub probe_start_delay_ms: u64,
    /// Wall-clock ceiling for the whole run, launch included.
    #[serde(default = "default_workflow_timeout_ms")]
    pub workflow_timeout_ms: u64,
    /// Consecutive status read failures tolerated before the run fails.
    #[serde(default)]
    pub poll_error_budget: u32,
}

fn default_poll_interval_ms() -> u64 {
    5_000
}
fn default_probe_max_attempts() -> u32 {
    20
}
fn default_probe_attempt_timeout_ms() -> u64 {
    3_000
}
fn default_probe_delay_ms() -> u64 {
    1_000
}
fn default_probe_start_delay_ms() -> u64 {
    5_000
}
fn default_workflow_timeout_ms() -> u64 {
    300_000
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            probe_max_attempts: default_probe_max_attempts(),
            probe_attempt_timeout_ms: default_probe_attempt_timeout_ms(),
            probe_delay_ms: default_probe_delay_ms(),
            probe_start_delay_ms: default_probe_start_delay_ms(),
            workflow_timeout_ms: default_workflow_timeout_ms(),
            poll_error_budget: 0,
        }
    }
}

impl WorkflowConfig {
    /// Load config from a JSON file, or return defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                warn!("Ignoring invalid workflow config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup. Unparseable values are skipped.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let num = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        if let Some(v) = num("CHAOS_POLL_INTERVAL_MS") {
            self.poll_interval_ms = v;
        }
        if let Some(v) = num("CHAOS_PROBE_MAX_ATTEMPTS").or_else(|| num("NB_TRIES")) {
            self.probe_max_attempts = v as u32;
        }
        if let Some(v) = num("CHAOS_PROBE_TIMEOUT_MS") {
            self.probe_attempt_timeout_ms = v;
        }
        if let Some(v) = num("CHAOS_PROBE_DELAY_MS") {
            self.probe_delay_ms = v;
        }
        if let Some(v) = num("CHAOS_PROBE_START_DELAY_MS") {
            self.probe_start_delay_ms = v;
        }
        if let Some(v) = num("CHAOS_WORKFLOW_TIMEOUT_MS") {
            self.workflow_timeout_ms = v;
        }
        if let Some(v) = num("CHAOS_POLL_ERROR_BUDGET") {
            self.poll_error_budget = v as u32;
        }
    }

    /// Reject settings that would make the workflow spin or never start probing.
    pub fn validate(&self) -> Result<()> {
        if self.probe_max_attempts == 0 {
            return Err(Error::Config("probe_max_attempts must be at least 1".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be greater than 0".into()));
        }
        if self.workflow_timeout_ms == 0 {
            return Err(Error::Config("workflow_timeout_ms must be greater than 0".into()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn probe_attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_attempt_timeout_ms)
    }

    pub fn probe_delay(&self) -> Duration {
        Duration::from_millis(self.probe_delay_ms)
    }

    pub fn probe_start_delay(&self) -> Duration {
        Duration::from_millis(self.probe_start_delay_ms)
    }

    pub fn workflow_timeout(&self) -> Duration {
        Duration::from_millis(self.workflow_timeout_ms)
    }
}

/// Top-level chaos game configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChaosGameConfig {
    /// HTTP server port.
    pub port: u16,
    /// Tag selecting the fault templates that belong to this project.
    pub project_tag: String,
    /// Health endpoint of the target service.
    pub app_url: String,
    /// Base URL of the fault-injection backend.
    pub fault_backend_url: String,
    /// Record identity of the persisted score.
    pub score_key: String,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Workflow timing.
    pub workflow: WorkflowConfig,
}

impl ChaosGameConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);
        let env_or = |key: &str, default: &str| {
            std::env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let data_paths = DataPaths::new(data_dir)?;
        let mut workflow = WorkflowConfig::load(&data_paths.workflow_file);
        workflow.apply_env();
        workflow.validate()?;

        Ok(Self {
            port,
            project_tag: env_or("PROJECT_TAG", "chaos-game"),
            app_url: env_or("APP_URL", "http://localhost:3000/health"),
            fault_backend_url: env_or("FAULT_BACKEND_URL", "http://localhost:4566"),
            score_key: env_or("SCORE_KEY", "score"),
            data_paths,
            workflow,
        })
    }
}
