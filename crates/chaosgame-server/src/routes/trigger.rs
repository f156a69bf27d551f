//! Trigger route — turns an incoming event into one queued experiment run.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, warn};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/trigger", post(trigger))
}

/// Event message. Both fields are optional; an empty body is a valid trigger.
#[derive(Debug, Default, Deserialize)]
pub struct TriggerEvent {
    pub tag: Option<String>,
    pub source: Option<String>,
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message.into() })),
    )
}

/// POST /api/trigger — enqueue one run and return its job id.
async fn trigger(State(state): State<Arc<AppState>>, body: Bytes) -> impl IntoResponse {
    let event: TriggerEvent = if body.iter().all(u8::is_ascii_whitespace) {
        TriggerEvent::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(event) => event,
            Err(e) => return bad_request(format!("Invalid event message: {}", e)),
        }
    };

    let tag = match event.tag {
        Some(tag) => tag.trim().to_string(),
        None => state.config.project_tag.clone(),
    };
    if tag.is_empty() {
        return bad_request("tag must not be empty");
    }

    match state.enqueue(tag.clone(), event.source) {
        Some(job) => {
            info!("Queued run job {} for tag {}", job.id, tag);
            (
                StatusCode::ACCEPTED,
                Json(serde_json::json!({
                    "jobId": job.id,
                    "status": job.status,
                })),
            )
        }
        None => {
            warn!("Run worker is not accepting jobs");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "error": "Run worker unavailable" })),
            )
        }
    }
}
