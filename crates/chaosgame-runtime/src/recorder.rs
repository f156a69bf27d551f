//! Applies verdicts to the score record, one atomic increment each.

use std::sync::Arc;

use tracing::info;

use chaosgame_core::{Error, Result};
use chaosgame_store::{ScoreField, ScoreStore};

use crate::types::Verdict;

/// Applies verdicts to the score record identified by `key`.
///
/// Does not deduplicate; the orchestrator enters the record step at most once per run.
pub struct ScoreRecorder {
    store: Arc<dyn ScoreStore>,
    key: String,
}

impl ScoreRecorder {
    pub fn new(store: Arc<dyn ScoreStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the counter that was incremented, or `None` for a verdict that scores nothing.
    pub async fn record(&self, verdict: Verdict) -> Result<Option<ScoreField>> {
        let Some(field) = verdict.score_field() else {
            return Ok(None);
        };

        let store = self.store.clone();
        let key = self.key.clone();
        tokio::task::spawn_blocking(move || store.increment(&key, field))
            .await
            .map_err(|e| Error::Persistence(format!("score write task failed: {}", e)))?
            .map_err(|e| match e {
                Error::Persistence(_) => e,
                other => Error::Persistence(other.to_string()),
            })?;

        info!("Recorded {} for score key {}", verdict, self.key);
        Ok(Some(field))
    }
}
