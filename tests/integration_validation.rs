mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{send, setup_offline_app};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

#[tokio::test]
async fn test_malformed_system_id_is_bad_request() {
    let app = setup_offline_app();

    let (status, body) = send(&app, "GET", "/api/system-ids/NOPE-1", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_missing_content_type_is_bad_request() {
    let app = setup_offline_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/users")
        .body(Body::from(r#"{"first_name":"Ada"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_field_is_bad_request() {
    let app = setup_offline_app();

    let (status, body) = send(
        &app,
        "POST",
        "/api/users",
        Some(json!({ "first_name": "Ada", "last_name": "Lovelace" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "email is required");
}

#[tokio::test]
async fn test_rule_violations_are_unprocessable() {
    let app = setup_offline_app();

    let (status, body) = send(
        &app,
        "POST",
        "/api/users",
        Some(json!({
            "first_name": "",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "password": "short",
            "role": "student"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("first_name must be 1-100 characters"));
    assert!(message.contains("password must be at least 8 characters"));
}

#[tokio::test]
async fn test_unknown_enrollment_action_is_bad_request() {
    let app = setup_offline_app();
    let uri = format!("/api/enrollments/{}/teleport", Uuid::new_v4());

    let (status, _) = send(&app, "POST", &uri, None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_query_parameters_are_bad_request() {
    let app = setup_offline_app();

    let (status, body) = send(&app, "GET", "/api/enrollments?status=sleeping", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid query parameters")
    );
}

#[tokio::test]
async fn test_negative_fee_is_unprocessable() {
    let app = setup_offline_app();

    let (status, _) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(json!({
            "user_id": Uuid::new_v4(),
            "class_name": "Robotics",
            "enrollment_type": "individual",
            "monthly_fee_cents": -1
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = setup_offline_app();

    let (status, body) = send(&app, "GET", "/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "LearnHub API");
}
