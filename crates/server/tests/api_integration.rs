//! In-process tests for the HTTP surface.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use docingest::{
    parse_allocated, BackendError, DocumentBackend, DocumentWrite, IngestResponse, IngestService,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use server::{build_router, ServerConfig, ServerState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn test_state() -> Arc<ServerState> {
    Arc::new(ServerState::new(
        ServerConfig::default(),
        IngestService::simulated(),
    ))
}

fn insert_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/documents")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn insert_without_uri_allocates_one() {
    let app = build_router(test_state());
    let response = app
        .oneshot(insert_request(json!({"json_data": "{\"title\":\"x\"}"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body: IngestResponse = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(body.status_code, 200);
    assert!(parse_allocated(body.uri.as_deref().unwrap()).is_some());
}

#[tokio::test]
async fn insert_with_uri_and_collections_echoes_uri() {
    let state = test_state();
    let app = build_router(state.clone());
    let response = app
        .oneshot(insert_request(json!({
            "json_data": "{\"a\":1}",
            "document_uri": "/customers/1.json",
            "collections": ["c1", "c2"],
            "metadata": {"source": "crm"}
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["document_uri"], "/customers/1.json");
    assert_eq!(state.service.fallback_store().count(), 1);
}

#[tokio::test]
async fn empty_payload_is_bad_request_with_body() {
    let app = build_router(test_state());
    let response = app.oneshot(insert_request(json!({}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["status_code"], 400);
    assert_eq!(body["status_message"], "Error: JSON data is required");
    assert!(body.get("document_uri").is_none());
}

#[tokio::test]
async fn malformed_payload_is_bad_request() {
    let app = build_router(test_state());
    let response = app
        .oneshot(insert_request(
            json!({"json_data": "{\"name\": \"Test\", \"invalid\": }"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["status_message"], "Error: Invalid JSON format");
}

#[tokio::test]
async fn request_id_is_propagated() {
    let app = build_router(test_state());
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn readiness_reports_mode_and_store_size() {
    let state = test_state();
    build_router(state.clone())
        .oneshot(insert_request(json!({"json_data": "[1,2]"})))
        .await
        .unwrap();

    let response = build_router(state)
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["backend"]["mode"], "simulated");
    assert_eq!(body["backend"]["fallback_documents"], 1);
    assert_eq!(body["backend"]["allocated_uris"], 1);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = build_router(test_state());
    let response = app
        .oneshot(Request::builder().uri("/v2/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn api_info_lists_insert_operation() {
    let app = build_router(test_state());
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["operations"], json!(["InsertDocument"]));
}

#[tokio::test]
async fn concurrent_http_inserts_get_distinct_counters() {
    let app = build_router(test_state());
    let handles: Vec<_> = (0..40)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let response = app
                    .oneshot(insert_request(json!({ "json_data": format!("{{\"i\":{i}}}") })))
                    .await
                    .unwrap();
                body_json(response).await
            })
        })
        .collect();

    let mut counters = Vec::new();
    for handle in handles {
        let body = handle.await.unwrap();
        let uri = body["document_uri"].as_str().unwrap().to_string();
        counters.push(parse_allocated(&uri).unwrap().0);
    }
    counters.sort_unstable();
    counters.dedup();
    assert_eq!(counters.len(), 40);
}

#[tokio::test]
async fn broken_envelope_is_rejected_before_the_pipeline() {
    let state = test_state();
    let request = Request::builder()
        .method("POST")
        .uri("/v1/documents")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = build_router(state.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(state.service.allocator().allocated(), 0);
}

#[tokio::test]
async fn oversized_body_is_payload_too_large() {
    let config = ServerConfig {
        max_body_size_mb: 1,
        ..ServerConfig::default()
    };
    let state = Arc::new(ServerState::new(config, IngestService::simulated()));
    let big = "x".repeat(2 * 1024 * 1024);
    let response = build_router(state)
        .oneshot(insert_request(json!({ "json_data": big })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
}

/// Backend that holds each write for a while and records how many
/// writes were in flight at once.
#[derive(Default)]
struct SlowBackend {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    writes: AtomicUsize,
}

#[async_trait]
impl DocumentBackend for SlowBackend {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn insert(&self, _write: DocumentWrite<'_>) -> Result<(), BackendError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn worker_limit_bounds_in_flight_writes() {
    let backend = Arc::new(SlowBackend::default());
    let config = ServerConfig {
        max_workers: 2,
        ..ServerConfig::default()
    };
    let state = Arc::new(ServerState::new(
        config,
        IngestService::with_backend(backend.clone()),
    ));
    let app = build_router(state);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                app.oneshot(insert_request(json!({ "json_data": format!("{{\"i\":{i}}}") })))
                    .await
                    .unwrap()
                    .status()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }
    assert_eq!(backend.writes.load(Ordering::SeqCst), 8);
    let peak = backend.peak.load(Ordering::SeqCst);
    assert!((1..=2).contains(&peak), "peak in-flight writes: {peak}");
}

#[tokio::test]
async fn zero_workers_still_serves_inserts() {
    let config = ServerConfig {
        max_workers: 0,
        ..ServerConfig::default()
    };
    let state = Arc::new(ServerState::new(config, IngestService::simulated()));
    let app = build_router(state);

    let response = tokio::time::timeout(
        Duration::from_secs(5),
        app.oneshot(insert_request(json!({ "json_data": "{}" }))),
    )
    .await
    .expect("insert stalled behind the worker limit")
    .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
