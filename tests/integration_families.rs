mod common;

use axum::Router;
use axum::http::StatusCode;
use common::{create_approved_enrollment, create_user, send, setup_test_app};
use serde_json::{Value, json};
use sqlx::PgPool;

async fn create_family(app: &Router, guardian: &Value) -> Value {
    let (status, family) = send(
        app,
        "POST",
        "/api/families",
        Some(json!({
            "guardian_id": guardian["id"],
            "name": "The Adeyemis"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create family: {family}");
    family
}

async fn add_member(app: &Router, family_id: &str, first_name: &str) -> Value {
    let (status, member) = send(
        app,
        "POST",
        &format!("/api/families/{}/members", family_id),
        Some(json!({
            "first_name": first_name,
            "last_name": "Adeyemi",
            "relationship": "child",
            "date_of_birth": "2014-06-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "add member: {member}");
    member
}

fn family_enrollment(guardian: &Value, family_id: &str) -> Value {
    json!({
        "user_id": guardian["id"],
        "class_name": "Creative Coding",
        "enrollment_type": "family",
        "family_id": family_id,
        "monthly_fee_cents": 12000
    })
}

#[sqlx::test(migrations = "./migrations")]
async fn test_family_with_members(pool: PgPool) {
    let app = setup_test_app(pool);
    let guardian = create_user(&app, "Funmi", "parent").await;
    let family = create_family(&app, &guardian).await;
    let family_id = family["id"].as_str().unwrap();
    assert!(family["system_id"].as_str().unwrap().starts_with("FAM-"));

    let tola = add_member(&app, family_id, "Tola").await;
    add_member(&app, family_id, "Dayo").await;
    assert!(tola["system_id"].as_str().unwrap().starts_with("STU-"));

    let (status, fetched) = send(&app, "GET", &format!("/api/families/{}", family_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["guardian_id"], guardian["id"]);
    assert_eq!(fetched["members"].as_array().unwrap().len(), 2);

    let (status, resolution) = send(
        &app,
        "GET",
        &format!("/api/system-ids/{}", family["system_id"].as_str().unwrap()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolution["display_name"], "The Adeyemis");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_family_needs_existing_guardian_and_members(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, _) = send(
        &app,
        "POST",
        "/api/families",
        Some(json!({
            "guardian_id": "00000000-0000-0000-0000-000000000000",
            "name": "Nobody"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let guardian = create_user(&app, "Funmi", "parent").await;
    let family = create_family(&app, &guardian).await;
    let family_id = family["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(family_enrollment(&guardian, family_id)),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_family_cards_fan_out_and_follow_removed_members(pool: PgPool) {
    let app = setup_test_app(pool);
    let guardian = create_user(&app, "Funmi", "parent").await;
    let family = create_family(&app, &guardian).await;
    let family_id = family["id"].as_str().unwrap();
    let tola = add_member(&app, family_id, "Tola").await;
    let dayo = add_member(&app, family_id, "Dayo").await;

    let enrollment_id =
        create_approved_enrollment(&app, family_enrollment(&guardian, family_id)).await;
    let issue_uri = format!("/api/id-cards/enrollments/{}", enrollment_id);

    let (status, issued) = send(&app, "POST", &issue_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(issued["newly_issued"], 2);
    let mut numbers: Vec<&str> = issued["cards"]
        .as_array()
        .unwrap()
        .iter()
        .map(|card| card["card_number"].as_str().unwrap())
        .collect();
    numbers.sort_unstable();
    let mut expected = vec![
        tola["system_id"].as_str().unwrap(),
        dayo["system_id"].as_str().unwrap(),
    ];
    expected.sort_unstable();
    assert_eq!(numbers, expected);

    let dayo_card = issued["cards"]
        .as_array()
        .unwrap()
        .iter()
        .find(|card| card["holder_id"] == dayo["id"])
        .unwrap()
        .clone();

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/families/{}/members/{}", family_id, dayo["id"].as_str().unwrap()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let dayo_token = dayo_card["qr_token"].as_str().unwrap();
    let (status, _) = send(&app, "GET", &format!("/api/id-cards/scan/{}", dayo_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, reissued) = send(&app, "POST", &issue_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reissued["newly_issued"], 0);
    let live = reissued["cards"].as_array().unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0]["holder_id"], tola["id"]);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/families/{}/members/{}", family_id, dayo["id"].as_str().unwrap()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
