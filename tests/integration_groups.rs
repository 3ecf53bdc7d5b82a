mod common;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use common::{create_approved_enrollment, create_user, id_of, send, setup_test_app};
use serde_json::{Value, json};
use sqlx::PgPool;

async fn create_group(app: &Router, leader: &Value, max_members: i32) -> Value {
    let (status, group) = send(
        app,
        "POST",
        "/api/groups",
        Some(json!({
            "name": "Saturday Builders",
            "class_name": "Robotics",
            "leader_id": leader["id"],
            "max_members": max_members
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create group: {group}");
    group
}

fn group_enrollment(user: &Value, group: &Value) -> Value {
    json!({
        "user_id": user["id"],
        "class_name": "Robotics",
        "enrollment_type": "group",
        "group_class_id": group["id"],
        "monthly_fee_cents": 8000
    })
}

#[sqlx::test(migrations = "./migrations")]
async fn test_group_member_count_and_capacity(pool: PgPool) {
    let app = setup_test_app(pool);
    let leader = create_user(&app, "Grace", "teacher").await;
    let group = create_group(&app, &leader, 2).await;
    let group_uri = format!("/api/groups/{}", group["id"].as_str().unwrap());
    assert!(group["system_id"].as_str().unwrap().starts_with("GRO-"));

    for name in ["Ada", "Alan"] {
        let student = create_user(&app, name, "student").await;
        let (status, _) = send(
            &app,
            "POST",
            "/api/enrollments",
            Some(group_enrollment(&student, &group)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, fetched) = send(&app, "GET", &group_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["member_count"], 2);

    let late = create_user(&app, "Edsger", "student").await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(group_enrollment(&late, &group)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, members) =
        send(&app, "GET", &format!("{}/enrollments", group_uri), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(members["meta"]["total"], 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_group_enrollment_must_match_class(pool: PgPool) {
    let app = setup_test_app(pool);
    let leader = create_user(&app, "Grace", "teacher").await;
    let group = create_group(&app, &leader, 5).await;
    let student = create_user(&app, "Ada", "student").await;

    let mut body = group_enrollment(&student, &group);
    body["class_name"] = json!("Chess");
    let (status, _) = send(&app, "POST", "/api/enrollments", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        "POST",
        "/api/groups",
        Some(json!({
            "name": "Orphans",
            "class_name": "Robotics",
            "leader_id": "00000000-0000-0000-0000-000000000000",
            "max_members": 3
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_group_capacity_holds_under_concurrent_enrollment(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let leader = create_user(&app, "Grace", "teacher").await;
    let group = create_group(&app, &leader, 2).await;

    let first = create_user(&app, "Ada", "student").await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(group_enrollment(&first, &group)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let second = create_user(&app, "Alan", "student").await;
    let third = create_user(&app, "Edsger", "student").await;

    // Another writer holds the group lock while taking the last seat.
    let mut competing = pool.begin().await.unwrap();
    sqlx::query("SELECT id FROM group_classes WHERE id = $1 FOR UPDATE")
        .bind(id_of(&group))
        .execute(&mut *competing)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO class_enrollments (user_id, class_name, enrollment_type, group_class_id)
         VALUES ($1, 'Robotics', 'group', $2)",
    )
    .bind(id_of(&second))
    .bind(id_of(&group))
    .execute(&mut *competing)
    .await
    .unwrap();

    let request = tokio::spawn({
        let app = app.clone();
        let body = group_enrollment(&third, &group);
        async move { send(&app, "POST", "/api/enrollments", Some(body)).await }
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    competing.commit().await.unwrap();

    let (status, _) = request.await.unwrap();
    assert_eq!(status, StatusCode::CONFLICT);

    let active: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM class_enrollments
         WHERE group_class_id = $1 AND status IN ('pending', 'approved')",
    )
    .bind(id_of(&group))
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(active, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_group_card_is_issued_to_the_group(pool: PgPool) {
    let app = setup_test_app(pool);
    let leader = create_user(&app, "Grace", "teacher").await;
    let group = create_group(&app, &leader, 4).await;
    let student = create_user(&app, "Ada", "student").await;

    let enrollment_id = create_approved_enrollment(&app, group_enrollment(&student, &group)).await;

    let (status, issued) = send(
        &app,
        "POST",
        &format!("/api/id-cards/enrollments/{}", enrollment_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(issued["newly_issued"], 1);
    let card = &issued["cards"][0];
    assert_eq!(card["card_number"], group["system_id"]);
    assert_eq!(card["holder_type"], "group");
    assert_eq!(card["holder_name"], "Saturday Builders");
}
