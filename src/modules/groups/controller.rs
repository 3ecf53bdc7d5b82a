use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use learnhub_core::{AppError, ErrorResponse, PaginationParams};
use learnhub_models::enrollments::PaginatedEnrollmentsResponse;
use learnhub_models::groups::{
    CreateGroupClassDto, GroupClass, GroupClassFilterParams, GroupClassWithStats,
    PaginatedGroupClassesResponse,
};
use uuid::Uuid;

use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::GroupService;

#[utoipa::path(
    post,
    path = "/api/groups",
    request_body = CreateGroupClassDto,
    responses(
        (status = 201, description = "Group class created with a GRO system id", body = GroupClass),
        (status = 404, description = "Group leader not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "Group Classes"
)]
pub async fn create_group(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateGroupClassDto>,
) -> Result<(StatusCode, Json<GroupClass>), AppError> {
    let group = GroupService::create_group(&state.db, &state.id_generator, dto).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

#[utoipa::path(
    get,
    path = "/api/groups",
    params(
        ("class_name" = Option<String>, Query, description = "Filter by class name (partial match)"),
        ("limit" = Option<i64>, Query, description = "Limit number of results"),
        ("offset" = Option<i64>, Query, description = "Offset for pagination"),
        ("page" = Option<i64>, Query, description = "Page number (overrides offset)")
    ),
    responses(
        (status = 200, description = "Group classes with member counts", body = PaginatedGroupClassesResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse)
    ),
    tag = "Group Classes"
)]
pub async fn list_groups(
    State(state): State<AppState>,
    filters: Result<Query<GroupClassFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedGroupClassesResponse>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;
    let groups = GroupService::list_groups(&state.db, filters).await?;
    Ok(Json(groups))
}

#[utoipa::path(
    get,
    path = "/api/groups/{id}",
    params(("id" = Uuid, Path, description = "Group class ID")),
    responses(
        (status = 200, description = "Group class with member count", body = GroupClassWithStats),
        (status = 404, description = "Group class not found", body = ErrorResponse)
    ),
    tag = "Group Classes"
)]
pub async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupClassWithStats>, AppError> {
    let group = GroupService::get_group(&state.db, id).await?;
    Ok(Json(group))
}

#[utoipa::path(
    get,
    path = "/api/groups/{id}/enrollments",
    params(
        ("id" = Uuid, Path, description = "Group class ID"),
        ("limit" = Option<i64>, Query, description = "Limit number of results"),
        ("offset" = Option<i64>, Query, description = "Offset for pagination"),
        ("page" = Option<i64>, Query, description = "Page number (overrides offset)")
    ),
    responses(
        (status = 200, description = "Enrollments referencing the group", body = PaginatedEnrollmentsResponse),
        (status = 404, description = "Group class not found", body = ErrorResponse)
    ),
    tag = "Group Classes"
)]
pub async fn list_member_enrollments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    pagination: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<PaginatedEnrollmentsResponse>, AppError> {
    let Query(pagination) = pagination
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;
    let enrollments = GroupService::list_member_enrollments(&state.db, id, pagination).await?;
    Ok(Json(enrollments))
}
