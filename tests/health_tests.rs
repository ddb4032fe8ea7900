//! Health, readiness, and CORS posture tests.

#[allow(unused)]
mod support;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use rxgate::db::{ListPrescriptionsFilter, Repository, StoreStatus, UnconfiguredRepository};
use rxgate::models::{NewPrescription, Patient, Physician, Prescription, TopDrug};
use support::*;

fn refused() -> rxgate::Error {
    rxgate::Error::Internal("connection refused".to_string())
}

/// Store whose every call fails, as when the database is configured but
/// unreachable.
struct UnreachableStore;

#[async_trait]
impl Repository for UnreachableStore {
    async fn create_prescription(&self, _p: NewPrescription) -> rxgate::Result<Prescription> {
        Err(refused())
    }

    async fn find_or_create_drug(&self, _name: &str) -> rxgate::Result<i64> {
        Err(refused())
    }

    async fn is_physician_patient_linked(
        &self,
        _physician_id: i64,
        _patient_id: i64,
    ) -> rxgate::Result<bool> {
        Err(refused())
    }

    async fn list_prescriptions(
        &self,
        _filter: ListPrescriptionsFilter,
    ) -> rxgate::Result<Vec<Prescription>> {
        Err(refused())
    }

    async fn list_patients_for_physician(
        &self,
        _physician_id: i64,
    ) -> rxgate::Result<Vec<Patient>> {
        Err(refused())
    }

    async fn list_physicians_for_patient(
        &self,
        _patient_id: i64,
    ) -> rxgate::Result<Vec<Physician>> {
        Err(refused())
    }

    async fn top_drugs(
        &self,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
        _limit: i64,
        _patient_id: Option<i64>,
    ) -> rxgate::Result<Vec<TopDrug>> {
        Err(refused())
    }

    async fn ping(&self) -> StoreStatus {
        StoreStatus::Down
    }
}

#[tokio::test]
async fn healthz_is_always_ok() {
    let app = TestApp::new();

    let (status, _, body) = app.request(Method::GET, "/healthz", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn readyz_reports_store_health() {
    let app = TestApp::new();

    let (status, _, body) = app.request(Method::GET, "/readyz", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["db"], "ok");
}

#[tokio::test]
async fn readyz_without_a_store_reads_unknown() {
    let router = router_with_store(Arc::new(UnconfiguredRepository));

    let (status, _, body) = send(&router, Method::GET, "/readyz", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["db"], "unknown");
}

#[tokio::test]
async fn readyz_is_503_when_the_store_is_unreachable() {
    let router = router_with_store(Arc::new(UnreachableStore));

    let (status, _, body) = send(&router, Method::GET, "/readyz", &[], None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["db"], "down");
}

#[tokio::test]
async fn store_failures_surface_as_generic_internal_errors() {
    let router = router_with_store(Arc::new(UnreachableStore));

    let (status, _, body) = send(
        &router,
        Method::GET,
        "/prescriptions",
        &[("x-role", "admin")],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    // The cause stays in the logs; the body never carries store detail.
    assert_error(&body, "internal server error");
}

#[tokio::test]
async fn unconfigured_store_fails_writes_and_empties_reads() {
    let router = router_with_store(Arc::new(UnconfiguredRepository));

    let (status, _, body) = send(
        &router,
        Method::POST,
        "/prescriptions",
        &[("x-role", "physician"), ("x-user-id", "1")],
        Some(serde_json::json!({
            "patient_id": 1,
            "physician_id": 1,
            "drug_name": "Ibuprofen",
            "quantity": 1,
            "sig": "QD"
        })),
    )
    .await;
    // The link check comes first and reads false on the stub.
    assert_eq!(status, StatusCode::FORBIDDEN, "body: {body}");

    let (status, _, body) = send(
        &router,
        Method::GET,
        "/prescriptions",
        &[("x-role", "admin")],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"], serde_json::json!([]));
}

#[tokio::test]
async fn allow_listed_origin_is_reflected() {
    let app = TestApp::new();

    let (status, headers, _) = app
        .request(
            Method::GET,
            "/healthz",
            &[("origin", "http://localhost:5173")],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );
}

#[tokio::test]
async fn unlisted_origin_is_not_reflected() {
    let app = TestApp::new();

    let (status, headers, _) = app
        .request(
            Method::GET,
            "/healthz",
            &[("origin", "https://evil.example")],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers.get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn preflight_is_answered_by_the_cors_layer() {
    let app = TestApp::new();

    let (status, headers, _) = app
        .request(
            Method::OPTIONS,
            "/prescriptions",
            &[
                ("origin", "http://localhost:5173"),
                ("access-control-request-method", "POST"),
                ("access-control-request-headers", "content-type,x-role,x-user-id"),
            ],
            None,
        )
        .await;

    assert!(status.is_success(), "preflight failed: {status}");
    assert!(headers.get("access-control-allow-origin").is_some());
    let allow_headers = headers
        .get("access-control-allow-headers")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();
    assert!(allow_headers.contains("x-role"));
    assert!(allow_headers.contains("x-user-id"));
}
