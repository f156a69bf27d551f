//! HTTP client for the fault-injection backend.
//!
//! Wire shapes follow the experiment API: templates are listed under
//! `experimentTemplates`, runs are returned under `experiment` with their
//! status in `state.status`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::backend::FaultBackend;
use crate::types::{ExperimentTemplate, RunStatus};
use chaosgame_core::{Error, Result};

/// Tag key that ties templates and runs to a project.
pub const PROJECT_TAG_KEY: &str = "Project";

#[derive(Debug, Deserialize)]
struct TemplateList {
    #[serde(rename = "experimentTemplates", default)]
    experiment_templates: Vec<ExperimentTemplate>,
}

#[derive(Debug, Deserialize)]
struct ExperimentEnvelope {
    experiment: ExperimentBody,
}

#[derive(Debug, Deserialize)]
struct ExperimentBody {
    id: String,
    state: Option<ExperimentState>,
}

#[derive(Debug, Deserialize)]
struct ExperimentState {
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

/// Fault-injection backend reached over HTTP.
pub struct HttpFaultBackend {
    client: Client,
    base_url: String,
}

impl HttpFaultBackend {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Keep the templates tagged for `tag`, preserving backend order.
pub fn select_templates(body: &str, tag: &str) -> Result<Vec<ExperimentTemplate>> {
    let list: TemplateList = serde_json::from_str(body)?;
    Ok(list
        .experiment_templates
        .into_iter()
        .filter(|t| t.tags.get(PROJECT_TAG_KEY).map(String::as_str) == Some(tag))
        .collect())
}

/// Extract the run id from a start response.
pub fn parse_run_id(body: &str) -> Result<String> {
    let envelope: ExperimentEnvelope = serde_json::from_str(body)?;
    Ok(envelope.experiment.id)
}

/// Extract the status from a get-run response.
pub fn parse_run_status(body: &str) -> Result<RunStatus> {
    let envelope: ExperimentEnvelope =
        serde_json::from_str(body).map_err(|e| Error::Poll(format!("bad status body: {}", e)))?;
    let state = envelope
        .experiment
        .state
        .ok_or_else(|| Error::Poll(format!("run {} has no state", envelope.experiment.id)))?;
    if let Some(reason) = &state.reason {
        debug!("Run {} status reason: {}", envelope.experiment.id, reason);
    }
    state.status.parse()
}

#[async_trait]
impl FaultBackend for HttpFaultBackend {
    async fn list_templates(&self, tag: &str) -> Result<Vec<ExperimentTemplate>> {
        let url = format!("{}/experimentTemplates", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::LaunchRejected(format!("template lookup failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::LaunchRejected(format!(
                "template lookup returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::LaunchRejected(format!("template lookup failed: {}", e)))?;
        select_templates(&body, tag)
            .map_err(|e| Error::LaunchRejected(format!("bad template list: {}", e)))
    }

    async fn start_run(&self, template_id: &str, tag: &str) -> Result<String> {
        let url = format!("{}/experiments", self.base_url);
        let body = json!({
            "experimentTemplateId": template_id,
            "tags": { PROJECT_TAG_KEY: tag },
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::LaunchRejected(format!("start request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::LaunchRejected(format!("backend returned {}: {}", status, text)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::LaunchRejected(e.to_string()))?;
        let run_id = parse_run_id(&text)
            .map_err(|e| Error::LaunchRejected(format!("bad start response: {}", e)))?;
        info!("Started run {} from template {}", run_id, template_id);
        Ok(run_id)
    }

    async fn get_run_status(&self, run_id: &str) -> Result<RunStatus> {
        let url = format!("{}/experiments/{}", self.base_url, run_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Poll(format!("status request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Poll(format!(
                "status read for {} returned {}",
                run_id,
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::Poll(e.to_string()))?;
        parse_run_status(&text)
    }
}
