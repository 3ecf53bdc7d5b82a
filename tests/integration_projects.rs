mod common;

use axum::Router;
use axum::http::StatusCode;
use common::{create_user, send, setup_test_app};
use serde_json::{Value, json};
use sqlx::PgPool;

async fn create_project(app: &Router, owner: &Value, title: &str) -> String {
    let (status, project) = send(
        app,
        "POST",
        "/api/projects",
        Some(json!({
            "owner_id": owner["id"],
            "title": title,
            "project_url": "https://example.com/projects/demo",
            "class_name": "Web Design"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create project: {project}");
    assert_eq!(project["is_published"], false);
    assert_eq!(project["is_featured"], false);
    project["id"].as_str().unwrap().to_string()
}

async fn change(app: &Router, project_id: &str, action: &str) -> (StatusCode, Value) {
    send(app, "POST", &format!("/api/projects/{}/{}", project_id, action), None).await
}

fn showcase_titles(page: &Value) -> Vec<&str> {
    page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_showcase_lists_featured_first_then_newest(pool: PgPool) {
    let app = setup_test_app(pool);
    let owner = create_user(&app, "Ada", "student").await;

    let oldest = create_project(&app, &owner, "Weather Station").await;
    let middle = create_project(&app, &owner, "Pixel Art").await;
    let newest = create_project(&app, &owner, "Quiz Game").await;
    create_project(&app, &owner, "Unfinished").await;

    for id in [&oldest, &middle, &newest] {
        let (status, _) = change(&app, id, "publish").await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, featured) = change(&app, &oldest, "feature").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(featured["is_featured"], true);

    let (status, page) = send(&app, "GET", "/api/projects/showcase", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["meta"]["total"], 3);
    assert_eq!(
        showcase_titles(&page),
        vec!["Weather Station", "Quiz Game", "Pixel Art"]
    );

    let (status, _) = change(&app, &oldest, "unfeature").await;
    assert_eq!(status, StatusCode::OK);
    let (_, page) = send(&app, "GET", "/api/projects/showcase", None).await;
    assert_eq!(
        showcase_titles(&page),
        vec!["Quiz Game", "Pixel Art", "Weather Station"]
    );

    let (_, filtered) = send(&app, "GET", "/api/projects/showcase?class_name=Chess", None).await;
    assert_eq!(filtered["meta"]["total"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_only_published_projects_can_be_featured(pool: PgPool) {
    let app = setup_test_app(pool);
    let owner = create_user(&app, "Ada", "student").await;
    let project = create_project(&app, &owner, "Weather Station").await;

    let (status, _) = change(&app, &project, "feature").await;
    assert_eq!(status, StatusCode::CONFLICT);

    change(&app, &project, "publish").await;
    change(&app, &project, "feature").await;

    let (status, hidden) = change(&app, &project, "unpublish").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hidden["is_published"], false);
    assert_eq!(hidden["is_featured"], false);

    let (status, _) = change(&app, "00000000-0000-0000-0000-000000000000", "feature").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_project_crud_and_owner_listing(pool: PgPool) {
    let app = setup_test_app(pool);
    let owner = create_user(&app, "Ada", "student").await;
    let other = create_user(&app, "Alan", "student").await;
    let project = create_project(&app, &owner, "Weather Station").await;
    create_project(&app, &other, "Chess Bot").await;
    let uri = format!("/api/projects/{}", project);

    let (status, updated) = send(
        &app,
        "PATCH",
        &uri,
        Some(json!({ "description": "Arduino-powered weather logger" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["description"], "Arduino-powered weather logger");
    assert_eq!(updated["title"], "Weather Station");

    let owner_uri = format!("/api/users/{}/projects", owner["id"].as_str().unwrap());
    let (status, owned) = send(&app, "GET", &owner_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(owned["meta"]["total"], 1);
    assert_eq!(owned["data"][0]["id"], project.as_str());

    let (status, _) = send(
        &app,
        "GET",
        "/api/users/00000000-0000-0000-0000-000000000000/projects",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/api/projects",
        Some(json!({
            "owner_id": "00000000-0000-0000-0000-000000000000",
            "title": "Ghost",
            "project_url": "https://example.com/ghost"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
