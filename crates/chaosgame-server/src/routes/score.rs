//! Score routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tracing::error;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/score", get(get_score))
}

/// GET /api/score — current win/loss counters.
async fn get_score(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let key = &state.config.score_key;
    match state.store.get_score(key) {
        Ok(record) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "won": record.won,
                "lost": record.lost,
                "key": key,
            })),
        ),
        Err(e) => {
            error!("Failed to read score {}: {}", key, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
        }
    }
}
