//! HTTP surface tests: request parsing, status codes and response shapes.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use clado_client::CladoError;
use common::*;
use serde_json::{json, Value};
use tower::ServiceExt;

fn post_search(body: Value, call_id: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/expert-search")
        .header("content-type", "application/json");
    if let Some(call_id) = call_id {
        builder = builder.header("x-call-id", call_id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn submit_returns_search_and_call_ids() {
    let harness = TestHarness::new();

    let response = harness
        .app()
        .oneshot(post_search(
            json!({ "search_query": "robotics", "user_first_name": "Ada" }),
            Some("call-abc"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Search initiated successfully");
    assert_eq!(body["search_id"], "job-1");
    assert_eq!(body["call_id"], "call-abc");
}

#[tokio::test]
async fn submit_generates_call_id_when_header_absent() {
    let harness = TestHarness::new();

    let response = harness
        .app()
        .oneshot(post_search(json!({ "search_query": "robotics" }), None))
        .await
        .unwrap();

    let body = json_body(response).await;
    assert!(body["call_id"].as_str().unwrap().starts_with("direct-"));
}

#[tokio::test]
async fn missing_query_is_a_bad_request() {
    let harness = TestHarness::new();

    let response = harness
        .app()
        .oneshot(post_search(json!({ "project_id": null }), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "search_query is required");
    assert!(harness.api.initiate_calls().is_empty());
}

#[tokio::test]
async fn missing_api_key_is_a_server_error() {
    let harness = TestHarness::without_api_key();

    let response = harness
        .app()
        .oneshot(post_search(json!({ "search_query": "robotics" }), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Clado API key not configured");
}

#[tokio::test]
async fn upstream_initiation_status_is_passed_through() {
    let harness = TestHarness::new();
    harness.api.fail_next_initiate(CladoError::Api {
        status: 403,
        message: "forbidden".into(),
    });
    let project_id = uuid::Uuid::new_v4();

    let response = harness
        .app()
        .oneshot(post_search(
            json!({ "search_query": "robotics", "project_id": project_id.to_string() }),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Failed to initiate Clado search");
    assert_eq!(body["details"], "forbidden");
    assert_eq!(
        harness.store.project(project_id).unwrap().status,
        Some(expert_search::domains::expert_search::ProjectStatus::Failed)
    );
}

#[tokio::test]
async fn malformed_project_id_is_rejected() {
    let harness = TestHarness::new();

    let response = harness
        .app()
        .oneshot(post_search(
            json!({ "search_query": "robotics", "project_id": "nope" }),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(harness.api.initiate_calls().is_empty());
}

#[tokio::test]
async fn health_reports_active_polling() {
    let harness = TestHarness::new();
    let app = harness.app();

    app.clone()
        .oneshot(post_search(json!({ "search_query": "a" }), None))
        .await
        .unwrap();
    app.clone()
        .oneshot(post_search(json!({ "search_query": "b" }), None))
        .await
        .unwrap();

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["activePolling"], 2);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn job_lookup() {
    let harness = TestHarness::new();
    let app = harness.app();

    app.clone()
        .oneshot(post_search(json!({ "search_query": "a" }), Some("call-1")))
        .await
        .unwrap();

    let response = app.clone().oneshot(get("/expert-search/call-1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["call_id"], "call-1");
    assert_eq!(body["state"], "POLLING");
    assert_eq!(body["remote_job_id"], "job-1");

    let response = app.oneshot(get("/expert-search/unknown")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
