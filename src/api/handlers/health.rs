//! Liveness and readiness endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{db::StoreStatus, state::AppState};

/// `GET /healthz` — process liveness, no dependencies checked.
pub async fn healthz() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}

/// `GET /readyz` — includes a bounded store connectivity check. Returns 503
/// when the store is configured but unreachable; an unconfigured store reads
/// as `"unknown"` with 200.
pub async fn readyz(State(state): State<AppState>) -> Response {
    let db = state.repo.ping().await;
    let body = json!({ "status": "ok", "db": db });

    let status = match db {
        StoreStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
        StoreStatus::Ok | StoreStatus::Unconfigured => StatusCode::OK,
    };

    (status, Json(body)).into_response()
}
