//! Integration tests for request validation and the JSON error envelope.
//!
//! All tests run before any database access: the send handler validates
//! the body first, extractors reject malformed input, and unknown
//! methods are refused by the router.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::http::header::CONTENT_TYPE;
use common::{body_json, get, post_json};
use serde_json::json;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Send validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_with_empty_content_returns_400_envelope() {
    let app = common::build_test_app();
    let response = post_json(
        app,
        "/api/v1/conversations/1/messages",
        json!({ "sender_id": 1, "content": "   " }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn send_with_oversized_content_returns_400() {
    let app = common::build_test_app();
    let response = post_json(
        app,
        "/api/v1/conversations/1/messages",
        json!({ "sender_id": 1, "content": "x".repeat(4001) }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn send_with_malformed_body_is_rejected() {
    let app = common::build_test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/conversations/1/messages")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn send_with_missing_fields_is_rejected() {
    let app = common::build_test_app();
    let response = post_json(
        app,
        "/api/v1/conversations/1/messages",
        json!({ "content": "hello" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ---------------------------------------------------------------------------
// Extractor validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn history_without_user_id_is_rejected() {
    let app = common::build_test_app();
    let response = get(app, "/api/v1/conversations/1/messages").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_numeric_conversation_id_is_rejected() {
    let app = common::build_test_app();
    let response = get(app, "/api/v1/conversations/abc/messages?user_id=1").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Method routing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unsupported_method_returns_405() {
    let app = common::build_test_app();
    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/v1/conversations/1/messages")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
