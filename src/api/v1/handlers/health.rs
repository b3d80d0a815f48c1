/*
 * Responsibility
 * - GET /health (liveness)
 * - Reports whether the consent admin handler has been bound yet (does not trigger the build)
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let handler = state.handlers.current().map(|h| h.name());

    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "handlerBound": handler.is_some(),
            "handler": handler,
        })),
    )
}
