//! Experiment launch: template lookup by tag, then a single start request.

use std::sync::Arc;

use tracing::{debug, info};

use chaosgame_core::{Error, Result};
use chaosgame_fault::{ExperimentRun, FaultBackend};

/// Selects the template for a project tag and starts it.
///
/// Never retries: a second start request could leave two runs active.
pub struct ExperimentLauncher {
    backend: Arc<dyn FaultBackend>,
}

impl ExperimentLauncher {
    pub fn new(backend: Arc<dyn FaultBackend>) -> Self {
        Self { backend }
    }

    pub async fn launch(&self, tag: &str) -> Result<ExperimentRun> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(Error::LaunchRejected("target tag must not be empty".into()));
        }

        let templates = self.backend.list_templates(tag).await.map_err(into_launch_error)?;
        let candidates = templates.len();
        let template = templates
            .into_iter()
            .next()
            .ok_or_else(|| Error::NoTemplateFound(tag.to_string()))?;
        debug!(
            "Selected template {} ({} candidates for tag {})",
            template.id, candidates, tag
        );

        let run_id = self
            .backend
            .start_run(&template.id, tag)
            .await
            .map_err(into_launch_error)?;
        info!("Launched run {} from template {}", run_id, template.id);

        Ok(ExperimentRun::new(run_id, template.id))
    }
}

fn into_launch_error(err: Error) -> Error {
    if err.is_launch_error() {
        err
    } else {
        Error::LaunchRejected(err.to_string())
    }
}
