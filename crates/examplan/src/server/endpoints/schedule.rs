//! Endpoints for reading and editing the user's exam schedule.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::account::{self, AccountError};
use crate::catalog::ExamId;
use crate::schedule::{PersistOutcome, ReconcileError};
use crate::server::types::ApiErrorType;
use crate::types::{AppReconciler, AppState};

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveSearchRequest {
    pub query: String,
}

fn schedule_response(reconciler: &AppReconciler, outcome: Option<PersistOutcome>) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "state": reconciler.state(),
            "outcome": outcome,
            "warning": reconciler.load_warning().map(|e| e.to_string()),
            "exams": reconciler.schedule(),
        })),
    )
        .into_response()
}

/// Converts a failed write-through to an API response.
///
/// The schedule change itself already happened in memory; the body says so.
fn persist_error_to_response(error: ReconcileError) -> Response {
    let (status, message) = match &error {
        ReconcileError::RemotePersist(_) => (
            StatusCode::BAD_GATEWAY,
            "Schedule updated but could not be saved to your account",
        ),
        ReconcileError::LocalPersist(_) | ReconcileError::StorageCorrupt { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Schedule updated but could not be saved locally",
        ),
    };

    ApiErrorType::from((status, message, Some(error.to_string()))).into_response()
}

/// GET /schedule
pub async fn get_schedule(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /schedule");

    let mut reconciler = s.reconciler.lock().await;
    reconciler.sync_auth();
    schedule_response(&reconciler, None)
}

/// POST /schedule/toggle
///
/// Adds the exam with the given id, or removes it if already scheduled.
pub async fn post_toggle_exam(
    State(s): State<Arc<AppState>>,
    Json(body): Json<ToggleRequest>,
) -> Response {
    info!("POST /schedule/toggle ({})", body.id);

    let id = ExamId::from_raw(body.id);
    let Some(exam) = s.catalog.get(&id) else {
        return ApiErrorType::from((StatusCode::NOT_FOUND, "Unknown exam", Some(id.to_string())))
            .into_response();
    };

    let mut reconciler = s.reconciler.lock().await;
    reconciler.sync_auth();
    match reconciler.toggle(exam.clone()).await {
        Ok(outcome) => schedule_response(&reconciler, Some(outcome)),
        Err(e) => {
            warn!("Toggle of {} not persisted: {}", id, e);
            persist_error_to_response(e)
        }
    }
}

/// DELETE /schedule/:exam_id
pub async fn delete_exam(
    Path(exam_id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("DELETE /schedule/{}", exam_id);

    let id = ExamId::from_raw(exam_id);
    let mut reconciler = s.reconciler.lock().await;
    reconciler.sync_auth();
    match reconciler.remove(&id).await {
        Ok(outcome) => schedule_response(&reconciler, Some(outcome)),
        Err(e) => {
            warn!("Removal of {} not persisted: {}", id, e);
            persist_error_to_response(e)
        }
    }
}

/// POST /saved_searches
pub async fn post_save_search(
    State(s): State<Arc<AppState>>,
    Json(body): Json<SaveSearchRequest>,
) -> Response {
    info!("POST /saved_searches ({:?})", body.query);

    match account::save_search(s.account.as_ref(), &body.query).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({ "outcome": format!("{:?}", outcome) })),
        )
            .into_response(),
        Err(AccountError::NotAuthenticated) => ApiErrorType::from((
            StatusCode::UNAUTHORIZED,
            "Sign up to save searches",
            None,
        ))
        .into_response(),
        Err(e) => {
            error!("Failed to save search: {}", e);
            ApiErrorType::from((
                StatusCode::BAD_GATEWAY,
                "Failed to save search",
                Some(e.to_string()),
            ))
            .into_response()
        }
    }
}
