use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::search::{self, ViewMode};
use crate::types::AppState;

/// Query parameters for exam search.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Comma-separated course codes or fragments
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub view: ViewMode,
}

/// GET /exams
///
/// Query parameters:
/// - `q`: comma-separated course search, e.g. `COMP202,MATH`
/// - `view` (optional): `current` (default) or `historical`
pub async fn get_search_exams(
    State(s): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    info!("GET /exams (q={:?}, view={:?})", params.q, params.view);

    let hits = search::search(s.catalog.exams(), &params.q, params.view, &s.partition);
    let reconciler = s.reconciler.lock().await;
    let schedule = reconciler.schedule();

    let results: Vec<_> = hits
        .into_iter()
        .map(|exam| {
            json!({
                "exam": exam,
                "added": schedule.contains(&exam.id),
            })
        })
        .collect();

    (
        StatusCode::OK,
        Json(json!({
            "view": params.view,
            "count": results.len(),
            "results": results,
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::endpoints::tests::{body_json, test_state};

    #[tokio::test]
    async fn test_search_marks_scheduled_exams() {
        let state = test_state();
        let first = state.catalog.exams()[0].clone();
        {
            let mut reconciler = state.reconciler.lock().await;
            reconciler.sync_auth();
            reconciler.toggle(first.clone()).await.unwrap();
        }

        let response = get_search_exams(
            State(state),
            Query(SearchParams {
                q: "comp".to_string(),
                view: ViewMode::Current,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["count"], 2);
        assert_eq!(body["results"][0]["exam"]["id"], first.id.as_str());
        assert_eq!(body["results"][0]["added"], true);
        assert_eq!(body["results"][1]["added"], false);
    }

    #[tokio::test]
    async fn test_historical_view() {
        let response = get_search_exams(
            State(test_state()),
            Query(SearchParams {
                q: "COMP202".to_string(),
                view: ViewMode::Historical,
            }),
        )
        .await;

        let body = body_json(response).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["results"][0]["exam"]["year"], "F2024");
    }
}
