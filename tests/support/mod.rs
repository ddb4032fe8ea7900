//! Shared test harness: the real router wired to a seeded in-memory store.

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use rxgate::config::{Config, DatabaseConfig, LoggingConfig, ServerConfig};
use rxgate::db::{InMemoryRepository, Repository};
use rxgate::{api::create_router, state::AppState};

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["http://localhost:5173".to_string()],
        },
        database: DatabaseConfig {
            url: None,
            pool_min_size: 1,
            pool_max_size: 1,
            pool_timeout_seconds: 5,
            ping_timeout_seconds: 1,
        },
        logging: LoggingConfig {
            level: "warn".to_string(),
            json: false,
        },
    }
}

pub struct TestApp {
    router: axum::Router,
    pub repo: Arc<InMemoryRepository>,
}

impl TestApp {
    /// Router over a fresh in-memory repository.
    pub fn new() -> Self {
        let repo = Arc::new(InMemoryRepository::new());
        Self::with_repo(repo)
    }

    pub fn with_repo(repo: Arc<InMemoryRepository>) -> Self {
        let state = AppState::with_repository(Arc::new(test_config()), repo.clone());
        Self {
            router: create_router(state),
            repo,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        headers: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> (StatusCode, HeaderMap, serde_json::Value) {
        send(&self.router, method, uri, headers, body).await
    }
}

/// Router over an arbitrary repository implementation, for exercising
/// failure paths the in-memory store never takes.
pub fn router_with_store(repo: Arc<dyn Repository>) -> axum::Router {
    create_router(AppState::with_repository(Arc::new(test_config()), repo))
}

/// Drive one request through a router and decode the JSON response.
pub async fn send(
    router: &axum::Router,
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<serde_json::Value>,
) -> (StatusCode, HeaderMap, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .expect("request build failed"),
        None => builder.body(Body::empty()).expect("request build failed"),
    };

    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router call failed");

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body read failed")
        .to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response was not JSON")
    };

    (status, headers, json)
}

/// Minimal clinic fixture: physician #1 "Dr. Bob" linked to patient #1
/// "Alice"; patient #2 "Carol" exists but is unlinked.
pub fn seed_clinic(repo: &InMemoryRepository) {
    let alice = repo.add_patient("Alice");
    repo.add_patient("Carol");
    let bob = repo.add_physician("Dr. Bob");
    repo.add_link(bob, alice);
}

pub fn assert_error(body: &serde_json::Value, expected: &str) {
    assert_eq!(
        body.get("error").and_then(|e| e.as_str()),
        Some(expected),
        "unexpected error body: {body}"
    );
}
