use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{error::StoreError, services::alerts_service, AppState};

// GET /alerts/:user_id
pub async fn get_alerts(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Response {
    let alerts = match alerts_service::list_alerts(&state, user_id).await {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    let items: Vec<serde_json::Value> = alerts
        .iter()
        .map(|a| {
            json!({
                "id": a.id,
                "ticker": a.ticker,
                "summary": a.describe(),
                "condition": a.condition,
                "created_at": a.created_at,
            })
        })
        .collect();

    (StatusCode::OK, Json(json!({ "alerts": items }))).into_response()
}

// POST /alerts/:user_id/:id/delete
pub async fn post_delete_alert(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(i64, i64)>,
) -> Response {
    match alerts_service::remove_alert(&state, user_id, id).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "deleted": id }))).into_response(),
        Err(StoreError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "alert not found" })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}
