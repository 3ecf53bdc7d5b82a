use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use learnhub_core::{AppError, ErrorResponse};
use learnhub_models::enrollments::{
    CreateEnrollmentDto, Enrollment, EnrollmentAction, EnrollmentFilterParams,
    PaginatedEnrollmentsResponse,
};
use uuid::Uuid;

use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::EnrollmentService;

#[utoipa::path(
    post,
    path = "/api/enrollments",
    request_body = CreateEnrollmentDto,
    responses(
        (status = 201, description = "Enrollment created as pending", body = Enrollment),
        (status = 404, description = "User, group, family or school not found", body = ErrorResponse),
        (status = 409, description = "Duplicate active enrollment or group is full", body = ErrorResponse),
        (status = 422, description = "Type and reference do not match", body = ErrorResponse)
    ),
    tag = "Enrollments"
)]
pub async fn create_enrollment(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateEnrollmentDto>,
) -> Result<(StatusCode, Json<Enrollment>), AppError> {
    let enrollment = EnrollmentService::create_enrollment(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[utoipa::path(
    get,
    path = "/api/enrollments",
    params(
        ("status" = Option<String>, Query, description = "pending, approved, rejected, cancelled or completed"),
        ("enrollment_type" = Option<String>, Query, description = "individual, group, family or school"),
        ("class_name" = Option<String>, Query, description = "Exact class name"),
        ("user_id" = Option<Uuid>, Query, description = "Applicant user ID"),
        ("limit" = Option<i64>, Query, description = "Limit number of results"),
        ("offset" = Option<i64>, Query, description = "Offset for pagination"),
        ("page" = Option<i64>, Query, description = "Page number (overrides offset)")
    ),
    responses(
        (status = 200, description = "Paginated list of enrollments", body = PaginatedEnrollmentsResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse)
    ),
    tag = "Enrollments"
)]
pub async fn list_enrollments(
    State(state): State<AppState>,
    filters: Result<Query<EnrollmentFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedEnrollmentsResponse>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;
    let enrollments = EnrollmentService::list_enrollments(&state.db, filters).await?;
    Ok(Json(enrollments))
}

#[utoipa::path(
    get,
    path = "/api/enrollments/{id}",
    params(("id" = Uuid, Path, description = "Enrollment ID")),
    responses(
        (status = 200, description = "Enrollment details", body = Enrollment),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    tag = "Enrollments"
)]
pub async fn get_enrollment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Enrollment>, AppError> {
    let enrollment = EnrollmentService::get_enrollment(&state.db, id).await?;
    Ok(Json(enrollment))
}

#[utoipa::path(
    post,
    path = "/api/enrollments/{id}/{action}",
    params(
        ("id" = Uuid, Path, description = "Enrollment ID"),
        ("action" = EnrollmentAction, Path, description = "approve, reject, cancel or complete")
    ),
    responses(
        (status = 200, description = "Enrollment after the transition", body = Enrollment),
        (status = 400, description = "Unknown action", body = ErrorResponse),
        (status = 404, description = "Enrollment not found", body = ErrorResponse),
        (status = 409, description = "Transition not allowed from the current status", body = ErrorResponse)
    ),
    tag = "Enrollments"
)]
pub async fn transition_enrollment(
    State(state): State<AppState>,
    Path((id, action)): Path<(Uuid, EnrollmentAction)>,
) -> Result<Json<Enrollment>, AppError> {
    let enrollment = EnrollmentService::transition(&state.db, id, action).await?;
    Ok(Json(enrollment))
}
