//! Error types for the chaos game.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No experiment template found for tag: {0}")]
    NoTemplateFound(String),

    #[error("Launch rejected: {0}")]
    LaunchRejected(String),

    #[error("Probe error: {0}")]
    Probe(String),

    #[error("Poll error: {0}")]
    Poll(String),

    #[error("Workflow timed out after {0:?}")]
    WorkflowTimeout(Duration),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Errors raised while selecting or starting a fault-injection run.
    pub fn is_launch_error(&self) -> bool {
        matches!(self, Self::NoTemplateFound(_) | Self::LaunchRejected(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_error_grouping() {
        assert!(Error::NoTemplateFound("chaos".into()).is_launch_error());
        assert!(Error::LaunchRejected("busy".into()).is_launch_error());
        assert!(!Error::Poll("reset".into()).is_launch_error());
        assert!(!Error::Persistence("locked".into()).is_launch_error());
    }

    #[test]
    fn test_display() {
        let err = Error::WorkflowTimeout(Duration::from_secs(300));
        assert_eq!(err.to_string(), "Workflow timed out after 300s");
        let err = Error::NoTemplateFound("chaos-game".into());
        assert_eq!(err.to_string(), "No experiment template found for tag: chaos-game");
    }
}
