use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::server::endpoints::{exams, schedule, status};
use crate::types::AppState;

mod endpoints;
mod types;

/// Creates a router that can be used by `axum`.
///
/// # Parameters
/// - `app_state`: The app server state.
///
/// # Returns
/// The router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let schedule_router = Router::new()
        .route("/schedule", get(schedule::get_schedule))
        .route("/schedule/toggle", post(schedule::post_toggle_exam))
        .route("/schedule/:exam_id", delete(schedule::delete_exam))
        .route("/saved_searches", post(schedule::post_save_search));

    Router::new()
        .route("/health", get(status::get_health))
        .route("/exams", get(exams::get_search_exams))
        .merge(schedule_router)
        .with_state(app_state)
}
