//! HTTP front door: route table and cross-cutting layers.

pub mod handlers;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{state::AppState, Error};

/// Build the application router with CORS and request tracing applied.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route(
            "/prescriptions",
            get(handlers::prescriptions::list_prescriptions)
                .post(handlers::prescriptions::create_prescription),
        )
        .route("/analytics/top-drugs", get(handlers::analytics::top_drugs))
        .route(
            "/physicians/:id/patients",
            get(handlers::directory::patients_for_physician),
        )
        .route(
            "/patients/:id/physicians",
            get(handlers::directory::physicians_for_patient),
        )
        .route("/healthz", get(handlers::health::healthz))
        .route("/readyz", get(handlers::health::readyz))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Reflect allow-listed origins; a single `*` entry allows any origin.
/// Preflight requests are answered by the layer itself.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| o.parse::<HeaderValue>().ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-role"),
            HeaderName::from_static("x-user-id"),
        ])
}

async fn not_found() -> Error {
    Error::NotFound("not found".to_string())
}
