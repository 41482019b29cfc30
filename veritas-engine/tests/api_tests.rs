//! HTTP router tests (tower oneshot, no listener)

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use helpers::{engine, Script};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use veritas_engine::types::AdapterErrorKind;
use veritas_engine::{build_router, AppState};

fn app(scripts: &[(&str, Script)]) -> Router {
    build_router(AppState::new(Arc::new(engine(scripts))))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(app(&[]), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "veritas-engine");
    assert_eq!(body["models"], 5);
    assert!(body["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn test_list_models_filtered_by_kind() {
    let (status, body) = send(app(&[]), get("/api/models?kind=audio")).await;

    assert_eq!(status, StatusCode::OK);
    let models = body.as_array().unwrap();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0]["id"], "voice");
    assert_eq!(models[0]["contentKinds"], json!(["audio"]));
    assert_eq!(models[0]["speedClass"], "fast");
}

#[tokio::test]
async fn test_list_all_models() {
    let (status, body) = send(app(&[]), get("/api/models")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_list_models_invalid_kind() {
    let (status, body) = send(app(&[]), get("/api/models?kind=hologram")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_best_model() {
    let (status, body) = send(app(&[]), get("/api/models/best?kind=image")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "alpha");

    let (status, _) = send(app(&[]), get("/api/models/best")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(app(&[]), get("/api/models/best?kind=text")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_describe_model() {
    let (status, body) = send(app(&[]), get("/api/models/gamma")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["declaredAccuracy"], 80);

    let (status, body) = send(app(&[]), get("/api/models/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_detect_by_url() {
    let app = app(&[("alpha", Script::Score(90)), ("beta", Script::Score(85)), ("gamma", Script::Score(95))]);
    let request = post_json(
        "/api/detect",
        json!({
            "url": "https://media.example.com/upload/portrait.png",
            "modelIds": ["alpha", "beta", "gamma"]
        }),
    );

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overallScore"], 90);
    assert_eq!(body["isDeepfake"], true);
    assert_eq!(body["confidence"], "high");
    assert_eq!(body["ensembleAnalysis"]["recommendedAction"], "reject");
    assert_eq!(body["modelResults"].as_array().unwrap().len(), 3);
    assert_eq!(body["coverage"], "3 of 3 models responded");
    assert_eq!(body["requestedModels"], 3);
}

#[tokio::test]
async fn test_detect_by_payload() {
    let app = app(&[("alpha", Script::Score(8))]);
    // Minimal PNG signature, base64-encoded
    let request = post_json(
        "/api/detect",
        json!({ "dataBase64": "iVBORw0KGgoAAAANSUhEUg==" }),
    );

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ensembleAnalysis"]["recommendedAction"], "accept");
    assert_eq!(body["modelResults"][0]["modelId"], "alpha");
}

#[tokio::test]
async fn test_detect_requires_content() {
    let (status, body) = send(app(&[]), post_json("/api/detect", json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_detect_unrecognized_url() {
    let request = post_json("/api/detect", json!({ "url": "https://example.com/media/12345" }));

    let (status, body) = send(app(&[]), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "UNRECOGNIZED_CONTENT");
}

#[tokio::test]
async fn test_detect_kind_without_models() {
    let request = post_json(
        "/api/detect",
        json!({ "url": "https://example.com/feed/article", "kind": "text" }),
    );

    let (status, body) = send(app(&[]), request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "NO_MODEL_FOR_KIND");
}

#[tokio::test]
async fn test_detect_total_failure_is_bad_gateway() {
    let app = app(&[
        ("alpha", Script::Fail(AdapterErrorKind::ProviderError)),
        ("beta", Script::Fail(AdapterErrorKind::ParseError)),
    ]);
    let request = post_json(
        "/api/detect",
        json!({
            "url": "https://media.example.com/upload/portrait.jpg",
            "modelIds": ["alpha", "beta"]
        }),
    );

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "NO_RESULTS");
    let failures = body["error"]["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0]["modelId"], "alpha");
    assert_eq!(failures[0]["error"]["kind"], "providerError");
}

#[tokio::test]
async fn test_detect_zero_deadline_rejected() {
    let request = post_json(
        "/api/detect",
        json!({ "url": "https://media.example.com/a.jpg", "deadlineMs": 0 }),
    );

    let (status, _) = send(app(&[]), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
