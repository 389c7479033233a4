mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use common::{observation, setup_test_db, ScriptedSource, StaticRates};
use metals_backend::handlers::build_router;
use metals_backend::scrapers::PriceObservation;
use metals_backend::services::{
    analysis::AnalysisService,
    audit_log::AuditLog,
    ingestion::PriceIngestion,
    metal_service::{MetalService, ReadCaches},
    reconciler::PriceReconciler,
};
use metals_backend::AppState;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

async fn test_app(batch: Vec<PriceObservation>, dir: &tempfile::TempDir) -> Router {
    let db = setup_test_db().await.unwrap();
    app_with_db(db, batch, dir)
}

fn app_with_db(db: DatabaseConnection, batch: Vec<PriceObservation>, dir: &tempfile::TempDir) -> Router {
    let source = Arc::new(ScriptedSource::new(vec![Ok(batch)]));
    let reconciler = PriceReconciler::new(db.clone(), Arc::new(AuditLog::new(dir.path().join("audit.json"))));

    let state = AppState {
        db: db.clone(),
        // Zero TTL so every request sees the latest merge
        metal_service: MetalService::new(db.clone(), Arc::new(StaticRates::new(0.5)), ReadCaches::new(Duration::ZERO)),
        analysis: Arc::new(AnalysisService::new(db)),
        ingestion: Arc::new(PriceIngestion::new(source, reconciler)),
    };

    build_router(state)
}

async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn recent_batch() -> Vec<PriceObservation> {
    let today = chrono::Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc();
    vec![
        observation("GOLD", 6500.0, today - chrono::Duration::days(2)),
        observation("GOLD", 6600.0, today - chrono::Duration::days(1)),
        observation("SILVER", 75.0, today - chrono::Duration::days(1)),
    ]
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(Vec::new(), &dir).await;

    let (status, body) = send(&app, Method::GET, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_health_reports_unreachable_database() {
    let dir = tempfile::tempdir().unwrap();
    let db = setup_test_db().await.unwrap();
    let app = app_with_db(db.clone(), Vec::new(), &dir);

    db.close().await.unwrap();

    let (status, body) = send(&app, Method::GET, "/api/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_update_then_read() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(recent_batch(), &dir).await;

    let (status, body) = send(&app, Method::POST, "/api/metals/update").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["inserted"], 3);

    let (status, body) = send(&app, Method::GET, "/api/metals/current").await;
    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 4);
    assert_eq!(data[0]["symbol"], "GOLD");
    assert_eq!(data[0]["price"], 6600.0);
    assert!(data[2]["price"].is_null());

    let (_, body) = send(&app, Method::GET, "/api/metals/current?currency=usd").await;
    assert_eq!(body["data"][0]["price"], 3300.0);
    assert_eq!(body["data"][0]["unit"], "USD/g");
}

#[tokio::test]
async fn test_history_params() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(recent_batch(), &dir).await;
    send(&app, Method::POST, "/api/metals/update").await;

    let (status, body) = send(&app, Method::GET, "/api/metals/history?metal=GOLD").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/metals/history?metal=GOLD&date_from=01.03.2024&date_to=2024-03-05",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A bare end date covers that whole day
    let today = chrono::Utc::now().date_naive();
    let from = today - chrono::Duration::days(7);
    let to = today - chrono::Duration::days(1);
    let uri = format!("/api/metals/history?metal=gold&date_from={}&date_to={}", from, to);
    let (status, body) = send(&app, Method::GET, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let prices: Vec<f64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["price"].as_f64().unwrap())
        .collect();
    assert_eq!(prices, vec![6500.0, 6600.0]);
}

#[tokio::test]
async fn test_analysis_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(recent_batch(), &dir).await;

    let (status, _) = send(&app, Method::GET, "/api/metals/analysis?metal=GOLD").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/api/metals/analysis").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(&app, Method::POST, "/api/metals/update").await;

    let (status, body) = send(&app, Method::GET, "/api/metals/analysis?metal=GOLD").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["metal"], "GOLD");
    assert_eq!(body["data"]["trend"], "up");
    assert_eq!(body["data"]["volatility"], "low");
    assert_eq!(body["data"]["sentiment"], "positive");
}
