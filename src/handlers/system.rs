use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Redirect},
};
use serde_json::json;

use crate::error::{AppError, PAGE_NOT_FOUND};
use crate::state::AppState;

pub async fn root() -> Redirect {
    Redirect::to("/listings")
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}

/// Catch-all for unmatched paths and methods.
pub async fn not_found() -> AppError {
    AppError::not_found(PAGE_NOT_FOUND)
}
