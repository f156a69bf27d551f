//! Fault-injection backend contract.

use async_trait::async_trait;

use crate::types::{ExperimentTemplate, RunStatus};
use chaosgame_core::Result;

#[async_trait]
pub trait FaultBackend: Send + Sync {
    /// Templates carrying the given project tag, in backend order.
    async fn list_templates(&self, tag: &str) -> Result<Vec<ExperimentTemplate>>;

    /// Start a run of `template_id`, tagging it with `tag`. Returns the run id.
    ///
    /// A refusal must surface as `Error::LaunchRejected`.
    async fn start_run(&self, template_id: &str, tag: &str) -> Result<String>;

    /// Current status of a run. Must be safe to call repeatedly.
    async fn get_run_status(&self, run_id: &str) -> Result<RunStatus>;
}
