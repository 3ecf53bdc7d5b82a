mod common;

use axum::Router;
use axum::http::StatusCode;
use common::{create_approved_enrollment, create_user, send, setup_test_app};
use serde_json::{Value, json};
use sqlx::PgPool;

fn slot(day_of_week: i16, start_time: &str, end_time: &str) -> Value {
    json!({
        "class_name": "Robotics",
        "day_of_week": day_of_week,
        "start_time": start_time,
        "end_time": end_time,
        "timezone": "Africa/Lagos"
    })
}

async fn approved_enrollment(app: &Router, first_name: &str) -> String {
    let student = create_user(app, first_name, "student").await;
    create_approved_enrollment(
        app,
        json!({
            "user_id": student["id"],
            "class_name": "Robotics",
            "enrollment_type": "individual"
        }),
    )
    .await
}

#[sqlx::test(migrations = "./migrations")]
async fn test_class_times_reject_overlaps(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, monday) = send(&app, "POST", "/api/class-times", Some(slot(0, "09:00:00", "10:30:00"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(monday["timezone"], "Africa/Lagos");

    let (status, _) = send(&app, "POST", "/api/class-times", Some(slot(0, "10:00:00", "11:00:00"))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Touching ranges do not overlap.
    let (status, _) = send(&app, "POST", "/api/class-times", Some(slot(0, "10:30:00", "11:30:00"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, tuesday) = send(&app, "POST", "/api/class-times", Some(slot(1, "10:00:00", "11:00:00"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, "POST", "/api/class-times", Some(slot(2, "11:00:00", "10:00:00"))).await;
    assert!(status.is_client_error());

    let tuesday_uri = format!("/api/class-times/{}", tuesday["id"].as_str().unwrap());
    let (status, _) = send(&app, "PATCH", &tuesday_uri, Some(json!({ "day_of_week": 0 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, moved) = send(
        &app,
        "PATCH",
        &tuesday_uri,
        Some(json!({ "start_time": "15:00:00", "end_time": "16:00:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["start_time"], "15:00:00");

    let (status, listed) = send(&app, "GET", "/api/class-times?class_name=Robotics", None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0]["id"], monday["id"]);

    let (status, _) = send(&app, "DELETE", &tuesday_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", &tuesday_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_overlapping_class_times_admit_one(pool: PgPool) {
    let app = setup_test_app(pool);

    let (first, second) = tokio::join!(
        send(&app, "POST", "/api/class-times", Some(slot(4, "14:00:00", "15:00:00"))),
        send(&app, "POST", "/api/class-times", Some(slot(4, "14:30:00", "15:30:00"))),
    );

    let mut statuses = [first.0, second.0];
    statuses.sort_by_key(|status| status.as_u16());
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_attendance_upsert_and_summary(pool: PgPool) {
    let app = setup_test_app(pool);
    let enrollment_id = approved_enrollment(&app, "Ada").await;

    for (date, status) in [
        ("2025-03-03", "present"),
        ("2025-03-10", "absent"),
        ("2025-03-17", "late"),
    ] {
        let (code, record) = send(
            &app,
            "POST",
            "/api/attendance",
            Some(json!({
                "enrollment_id": enrollment_id,
                "class_date": date,
                "status": status
            })),
        )
        .await;
        assert_eq!(code, StatusCode::OK, "record attendance: {record}");
    }

    // Correcting a date replaces the earlier entry.
    let (status, corrected) = send(
        &app,
        "POST",
        "/api/attendance",
        Some(json!({
            "enrollment_id": enrollment_id,
            "class_date": "2025-03-10",
            "status": "excused",
            "note": "Doctor's appointment"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(corrected["status"], "excused");

    let records_uri = format!("/api/attendance/enrollments/{}", enrollment_id);
    let (status, records) = send(&app, "GET", &records_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(records.as_array().unwrap().len(), 3);

    let (_, ranged) = send(&app, "GET", &format!("{}?from=2025-03-05&to=2025-03-12", records_uri), None).await;
    assert_eq!(ranged.as_array().unwrap().len(), 1);

    let (status, summary) = send(&app, "GET", &format!("{}/summary", records_uri), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total"], 3);
    assert_eq!(summary["present"], 1);
    assert_eq!(summary["late"], 1);
    assert_eq!(summary["excused"], 1);
    assert_eq!(summary["absent"], 0);
    let rate = summary["attendance_rate"].as_f64().unwrap();
    assert!((rate - 2.0 / 3.0).abs() < 1e-9);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_bulk_attendance_is_all_or_nothing(pool: PgPool) {
    let app = setup_test_app(pool);
    let ada = approved_enrollment(&app, "Ada").await;
    let alan = approved_enrollment(&app, "Alan").await;

    let student = create_user(&app, "Edsger", "student").await;
    let (_, pending) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(json!({
            "user_id": student["id"],
            "class_name": "Robotics",
            "enrollment_type": "individual"
        })),
    )
    .await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/attendance/bulk",
        Some(json!({
            "class_date": "2025-03-05",
            "records": [
                { "enrollment_id": ada, "status": "present" },
                { "enrollment_id": pending["id"], "status": "present" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, records) = send(&app, "GET", &format!("/api/attendance/enrollments/{}", ada), None).await;
    assert_eq!(records.as_array().unwrap().len(), 0);

    let (status, stored) = send(
        &app,
        "POST",
        "/api/attendance/bulk",
        Some(json!({
            "class_date": "2025-03-05",
            "records": [
                { "enrollment_id": ada, "status": "present" },
                { "enrollment_id": alan, "status": "late" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored.as_array().unwrap().len(), 2);
}
