mod common;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use common::{create_approved_enrollment, create_user, id_of, send, setup_test_app};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

async fn approved_individual_enrollment(app: &Router) -> String {
    let student = create_user(app, "Ada", "student").await;
    create_approved_enrollment(
        app,
        json!({
            "user_id": student["id"],
            "class_name": "Robotics",
            "enrollment_type": "individual",
            "monthly_fee_cents": 5000
        }),
    )
    .await
}

async fn submit(app: &Router, enrollment_id: &str, month: &str, proof: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        &format!("/api/payments/enrollments/{}", enrollment_id),
        Some(json!({
            "billing_month": month,
            "amount_cents": 5000,
            "proof_url": format!("https://example.com/receipts/{proof}.png")
        })),
    )
    .await
}

async fn payment_status(app: &Router, enrollment_id: &str) -> Value {
    let (_, enrollment) = send(app, "GET", &format!("/api/enrollments/{}", enrollment_id), None).await;
    enrollment["payment_status"].clone()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_rejected_payment_can_be_resubmitted(pool: PgPool) {
    let app = setup_test_app(pool);
    let enrollment_id = approved_individual_enrollment(&app).await;

    let (status, payment) = submit(&app, &enrollment_id, "2025-04-01", "blurry").await;
    assert_eq!(status, StatusCode::CREATED);
    let payment_id = payment["id"].as_str().unwrap().to_string();

    let (status, pending) = send(&app, "GET", "/api/payments/pending", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending["meta"]["total"], 1);

    let (status, rejected) = send(
        &app,
        "POST",
        &format!("/api/payments/{}/reject", payment_id),
        Some(json!({ "note": "Receipt is unreadable" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["status"], "rejected");
    assert_eq!(rejected["reviewer_note"], "Receipt is unreadable");
    assert_eq!(payment_status(&app, &enrollment_id).await, "rejected");

    let (status, resubmitted) = submit(&app, &enrollment_id, "2025-04-20", "clear").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(resubmitted["id"], payment_id.as_str());
    assert_eq!(resubmitted["status"], "pending");
    assert_eq!(resubmitted["reviewer_note"], Value::Null);
    assert_eq!(resubmitted["proof_url"], "https://example.com/receipts/clear.png");
    assert_eq!(payment_status(&app, &enrollment_id).await, "pending_verification");

    let (status, verified) = send(
        &app,
        "POST",
        &format!("/api/payments/{}/verify", payment_id),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verified["status"], "verified");
    assert_eq!(payment_status(&app, &enrollment_id).await, "paid");

    let (status, _) = submit(&app, &enrollment_id, "2025-04-02", "again").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, history) = send(
        &app,
        "GET",
        &format!("/api/payments/enrollments/{}", enrollment_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["meta"]["total"], 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_payments_require_an_active_enrollment(pool: PgPool) {
    let app = setup_test_app(pool);
    let enrollment_id = approved_individual_enrollment(&app).await;

    let (status, _) =
        send(&app, "POST", &format!("/api/enrollments/{}/cancel", enrollment_id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = submit(&app, &enrollment_id, "2025-05-01", "late").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "POST",
        "/api/payments/00000000-0000-0000-0000-000000000000/verify",
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_review_locks_enrollment_before_payment(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let enrollment_id = approved_individual_enrollment(&app).await;
    let (_, payment) = submit(&app, &enrollment_id, "2025-06-01", "june").await;

    // Same order as a proof submission: enrollment row, then payment row.
    let mut submitter = pool.begin().await.unwrap();
    sqlx::query("SELECT id FROM class_enrollments WHERE id = $1 FOR UPDATE")
        .bind(Uuid::parse_str(&enrollment_id).unwrap())
        .execute(&mut *submitter)
        .await
        .unwrap();

    let review = tokio::spawn({
        let app = app.clone();
        let uri = format!("/api/payments/{}/verify", payment["id"].as_str().unwrap());
        async move { send(&app, "POST", &uri, Some(json!({}))).await }
    });

    tokio::time::sleep(Duration::from_millis(200)).await;

    sqlx::query("SELECT id FROM monthly_payments WHERE id = $1 FOR UPDATE")
        .bind(id_of(&payment))
        .execute(&mut *submitter)
        .await
        .unwrap();
    submitter.commit().await.unwrap();

    let (status, verified) = review.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verified["status"], "verified");
    assert_eq!(payment_status(&app, &enrollment_id).await, "paid");
}
