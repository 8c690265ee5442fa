//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use common::{open_service, FakeImageHost, FALLBACK};
use image_cache::{api::create_router, AppState};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

async fn create_test_app(host: std::sync::Arc<FakeImageHost>) -> (tempfile::TempDir, Router) {
    let (dir, service) = open_service(host).await;
    (dir, create_router(AppState::new(service)))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

// == Image Endpoint Tests ==

#[tokio::test]
async fn test_image_endpoint_returns_payload() {
    let host = FakeImageHost::new();
    let (_dir, app) = create_test_app(host.clone()).await;

    let response = app
        .oneshot(get("/image?url=https%3A%2F%2Fpicsum.photos%2F200%2F300&priority=high"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["url"], "https://picsum.photos/200/300");
    assert_eq!(json["fallback"], false);
    assert!(json["image"]
        .as_str()
        .unwrap()
        .starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn test_image_endpoint_serves_repeat_from_cache() {
    let host = FakeImageHost::new();
    let (_dir, app) = create_test_app(host.clone()).await;

    for _ in 0..3 {
        let response = app.clone().oneshot(get("/image?url=cached")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(host.request_count("cached"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_image_endpoint_fallback_for_broken_url() {
    let host = FakeImageHost::new();
    host.break_url("broken");
    let (_dir, app) = create_test_app(host).await;

    let response = app.oneshot(get("/image?url=broken")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["fallback"], true);
    assert_eq!(json["image"], FALLBACK);
}

#[tokio::test]
async fn test_image_endpoint_missing_url() {
    let (_dir, app) = create_test_app(FakeImageHost::new()).await;

    let response = app.oneshot(get("/image")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_image_endpoint_blank_url() {
    let (_dir, app) = create_test_app(FakeImageHost::new()).await;

    let response = app.oneshot(get("/image?url=%20")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("empty"));
}

// == Preload Endpoint Tests ==

#[tokio::test(start_paused = true)]
async fn test_preload_endpoint_reports_each_url() {
    let host = FakeImageHost::new();
    host.break_url("u2");
    let (_dir, app) = create_test_app(host).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/preload")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"urls":["u1","u2","u3"]}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r["status"] == "fulfilled"));
    assert_eq!(results[1]["fallback"], true);
    assert_eq!(results[2]["url"], "u3");
}

#[tokio::test]
async fn test_preload_endpoint_invalid_body() {
    let (_dir, app) = create_test_app(FakeImageHost::new()).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/preload")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"urls":[""]}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// == Reset Endpoint Tests ==

#[tokio::test]
async fn test_clear_cache_endpoint_forces_refetch() {
    let host = FakeImageHost::new();
    let (_dir, app) = create_test_app(host.clone()).await;

    app.clone().oneshot(get("/image?url=a")).await.unwrap();
    let response = app.clone().oneshot(delete("/cache")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    app.oneshot(get("/image?url=a")).await.unwrap();

    assert_eq!(host.request_count("a"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_clear_failed_endpoint_allows_retry() {
    let host = FakeImageHost::new();
    host.break_url("b");
    let (_dir, app) = create_test_app(host.clone()).await;

    app.clone().oneshot(get("/image?url=b")).await.unwrap();
    host.repair_url("b");

    let response = app.clone().oneshot(delete("/failed")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/image?url=b")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["fallback"], false);
    assert_eq!(host.request_count("b"), 4);
}

// == Stats / Health Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint() {
    let (_dir, app) = create_test_app(FakeImageHost::new()).await;

    app.clone().oneshot(get("/image?url=a")).await.unwrap();
    app.clone().oneshot(get("/image?url=a")).await.unwrap();
    let response = app.oneshot(get("/stats")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["store"]["hits"], 1);
    assert_eq!(json["store"]["total_entries"], 1);
    assert_eq!(json["max_concurrent"], 5);
    assert!((json["hit_rate"].as_f64().unwrap() - 0.5).abs() < 0.001);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (_dir, app) = create_test_app(FakeImageHost::new()).await;

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_unknown_route() {
    let (_dir, app) = create_test_app(FakeImageHost::new()).await;

    let response = app.oneshot(get("/nope")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
