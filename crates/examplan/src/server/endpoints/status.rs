use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;
use std::sync::Arc;

use crate::types::AppState;

/// GET /health
pub async fn get_health(State(s): State<Arc<AppState>>) -> Response {
    let reconciler = s.reconciler.lock().await;
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "exams": s.catalog.len(),
            "schedule_initialized": reconciler.is_initialized(),
        })),
    )
        .into_response()
}
