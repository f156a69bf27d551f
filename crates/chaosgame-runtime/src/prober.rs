//! Bounded liveness checks against the target while the fault is active.
//!
//! Individual attempts fail soft: an error, a timeout or an unhealthy answer
//! is remembered and the next attempt follows. Probing ends on the first
//! healthy answer or when the attempt budget runs out.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use chaosgame_core::{Error, Result, WorkflowConfig};

use crate::types::HealthProbeResult;

/// One liveness check against the target. `Ok` carries the HTTP code of a healthy answer.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> Result<u16>;
}

/// `GET <url>` against the target's health endpoint.
pub struct HttpHealthCheck {
    client: Client,
    url: String,
}

impl HttpHealthCheck {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url)
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Healthy means 2xx and, for a JSON body with a `status` field, `"healthy"`.
pub fn interpret_health_response(code: u16, body: &str) -> Result<u16> {
    if !(200..300).contains(&code) {
        return Err(Error::Probe(format!("unhealthy: HTTP {}", code)));
    }
    let reported = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("status").and_then(|s| s.as_str()).map(str::to_string));
    match reported {
        Some(status) if status != "healthy" => {
            Err(Error::Probe(format!("unhealthy: HTTP {} status={}", code, status)))
        }
        _ => Ok(code),
    }
}

#[async_trait]
impl HealthCheck for HttpHealthCheck {
    async fn check(&self) -> Result<u16> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::Probe(format!("request to {} failed: {}", self.url, e)))?;
        let code = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        interpret_health_response(code, &body)
    }
}

/// Attempt budget and pacing for a probe phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbePolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub delay: Duration,
    pub start_delay: Duration,
}

impl ProbePolicy {
    pub fn from_config(config: &WorkflowConfig) -> Self {
        Self {
            max_attempts: config.probe_max_attempts,
            attempt_timeout: config.probe_attempt_timeout(),
            delay: config.probe_delay(),
            start_delay: config.probe_start_delay(),
        }
    }
}

pub struct HealthProber {
    check: Arc<dyn HealthCheck>,
    policy: ProbePolicy,
}

impl HealthProber {
    pub fn new(check: Arc<dyn HealthCheck>, policy: ProbePolicy) -> Self {
        Self { check, policy }
    }

    pub async fn probe(&self) -> HealthProbeResult {
        if !self.policy.start_delay.is_zero() {
            tokio::time::sleep(self.policy.start_delay).await;
        }

        let mut last_error = None;
        for attempt in 1..=self.policy.max_attempts {
            match tokio::time::timeout(self.policy.attempt_timeout, self.check.check()).await {
                Ok(Ok(code)) => {
                    debug!("Probe attempt {} healthy (HTTP {})", attempt, code);
                    return HealthProbeResult::healthy(attempt);
                }
                Ok(Err(e)) => {
                    debug!("Probe attempt {} failed: {}", attempt, e);
                    last_error = Some(e.to_string());
                }
                Err(_) => {
                    debug!("Probe attempt {} timed out", attempt);
                    last_error = Some(format!(
                        "attempt timed out after {:?}",
                        self.policy.attempt_timeout
                    ));
                }
            }
            if attempt < self.policy.max_attempts && !self.policy.delay.is_zero() {
                tokio::time::sleep(self.policy.delay).await;
            }
        }

        HealthProbeResult {
            attempts: self.policy.max_attempts,
            succeeded: false,
            last_error,
        }
    }
}
