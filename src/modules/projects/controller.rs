use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use learnhub_core::{AppError, ErrorResponse, PaginationParams};
use learnhub_models::projects::{
    CreateProjectDto, PaginatedProjectsResponse, ProjectFilterParams, ShowcaseParams,
    StudentProject, UpdateProjectDto,
};
use uuid::Uuid;

use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::{ProjectService, Visibility};

#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProjectDto,
    responses(
        (status = 201, description = "Project created as an unpublished draft", body = StudentProject),
        (status = 404, description = "Owner not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn create_project(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateProjectDto>,
) -> Result<(StatusCode, Json<StudentProject>), AppError> {
    let project = ProjectService::create_project(&state.db, state.cache(), dto).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

#[utoipa::path(
    get,
    path = "/api/projects",
    params(
        ("owner_id" = Option<Uuid>, Query, description = "Filter by owner"),
        ("is_published" = Option<bool>, Query, description = "Filter by published flag"),
        ("limit" = Option<i64>, Query, description = "Limit number of results"),
        ("offset" = Option<i64>, Query, description = "Offset for pagination"),
        ("page" = Option<i64>, Query, description = "Page number (overrides offset)")
    ),
    responses(
        (status = 200, description = "Paginated list of projects", body = PaginatedProjectsResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn list_projects(
    State(state): State<AppState>,
    filters: Result<Query<ProjectFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedProjectsResponse>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;
    let projects = ProjectService::list_projects(&state.db, filters).await?;
    Ok(Json(projects))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/projects",
    params(
        ("id" = Uuid, Path, description = "Owner user ID"),
        ("limit" = Option<i64>, Query, description = "Limit number of results"),
        ("offset" = Option<i64>, Query, description = "Offset for pagination"),
        ("page" = Option<i64>, Query, description = "Page number (overrides offset)")
    ),
    responses(
        (status = 200, description = "Projects of the user, drafts included", body = PaginatedProjectsResponse),
        (status = 404, description = "Owner not found", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn list_owner_projects(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    pagination: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<PaginatedProjectsResponse>, AppError> {
    let Query(pagination) = pagination
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;
    let projects = ProjectService::list_by_owner(&state.db, owner_id, pagination).await?;
    Ok(Json(projects))
}

#[utoipa::path(
    get,
    path = "/api/projects/showcase",
    params(
        ("class_name" = Option<String>, Query, description = "Exact class name"),
        ("limit" = Option<i64>, Query, description = "Limit number of results"),
        ("offset" = Option<i64>, Query, description = "Offset for pagination"),
        ("page" = Option<i64>, Query, description = "Page number (overrides offset)")
    ),
    responses(
        (status = 200, description = "Published projects, featured first then newest", body = PaginatedProjectsResponse),
        (status = 304, description = "Not modified (ETag matched)"),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn showcase(
    State(state): State<AppState>,
    params: Result<Query<ShowcaseParams>, QueryRejection>,
) -> Result<Json<PaginatedProjectsResponse>, AppError> {
    let Query(params) = params
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;
    let projects = ProjectService::showcase(&state.db, state.cache(), params).await?;
    Ok(Json(projects))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project", body = StudentProject),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StudentProject>, AppError> {
    let project = ProjectService::get_project(&state.db, id).await?;
    Ok(Json(project))
}

#[utoipa::path(
    patch,
    path = "/api/projects/{id}",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = UpdateProjectDto,
    responses(
        (status = 200, description = "Project updated", body = StudentProject),
        (status = 404, description = "Project not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateProjectDto>,
) -> Result<Json<StudentProject>, AppError> {
    let project = ProjectService::update_project(&state.db, state.cache(), id, dto).await?;
    Ok(Json(project))
}

#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ProjectService::delete_project(&state.db, state.cache(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_visibility(
    state: AppState,
    id: Uuid,
    change: Visibility,
) -> Result<Json<StudentProject>, AppError> {
    let project = ProjectService::set_visibility(&state.db, state.cache(), id, change).await?;
    Ok(Json(project))
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/publish",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project published", body = StudentProject),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn publish_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StudentProject>, AppError> {
    change_visibility(state, id, Visibility::Publish).await
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/unpublish",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project unpublished and unfeatured", body = StudentProject),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn unpublish_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StudentProject>, AppError> {
    change_visibility(state, id, Visibility::Unpublish).await
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/feature",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project featured", body = StudentProject),
        (status = 404, description = "Project not found", body = ErrorResponse),
        (status = 409, description = "Project is not published", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn feature_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StudentProject>, AppError> {
    change_visibility(state, id, Visibility::Feature).await
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/unfeature",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project no longer featured", body = StudentProject),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn unfeature_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StudentProject>, AppError> {
    change_visibility(state, id, Visibility::Unfeature).await
}
