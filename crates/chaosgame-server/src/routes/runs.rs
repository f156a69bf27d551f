//! Run status routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::{AppState, RunJob};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/runs", get(get_runs))
        .route("/runs/{job_id}", get(get_run))
}

/// GET /api/runs — all known runs, newest first.
async fn get_runs(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let runs = state.runs.read();
    let mut all: Vec<&RunJob> = runs.values().collect();
    all.sort_by(|a, b| b.queued_at.cmp(&a.queued_at));

    Json(serde_json::json!({
        "runs": all,
        "total": all.len(),
    }))
}

/// GET /api/runs/:jobId — a single run with its report once finished.
async fn get_run(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    let runs = state.runs.read();
    match runs.get(&job_id) {
        Some(job) => (StatusCode::OK, Json(serde_json::json!(job))),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Run not found" })),
        ),
    }
}
