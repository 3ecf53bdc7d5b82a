use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use learnhub_core::{AppError, ErrorResponse, PaginationParams};
use learnhub_models::schools::{
    CreateSchoolDto, CreateSchoolStudentDto, PaginatedSchoolStudentsResponse,
    PaginatedSchoolsResponse, School, SchoolFilterParams, SchoolStudent, UpdateSchoolDto,
};
use uuid::Uuid;

use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::SchoolService;

#[utoipa::path(
    post,
    path = "/api/schools",
    request_body = CreateSchoolDto,
    responses(
        (status = 201, description = "School created with a SCH system id", body = School),
        (status = 409, description = "School name already exists", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "Schools"
)]
pub async fn create_school(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateSchoolDto>,
) -> Result<(StatusCode, Json<School>), AppError> {
    let school = SchoolService::create_school(&state.db, &state.id_generator, dto).await?;
    Ok((StatusCode::CREATED, Json(school)))
}

#[utoipa::path(
    get,
    path = "/api/schools",
    params(
        ("name" = Option<String>, Query, description = "Filter by school name (partial match)"),
        ("limit" = Option<i64>, Query, description = "Limit number of results"),
        ("offset" = Option<i64>, Query, description = "Offset for pagination"),
        ("page" = Option<i64>, Query, description = "Page number (overrides offset)")
    ),
    responses(
        (status = 200, description = "Paginated list of schools", body = PaginatedSchoolsResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse)
    ),
    tag = "Schools"
)]
pub async fn list_schools(
    State(state): State<AppState>,
    filters: Result<Query<SchoolFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedSchoolsResponse>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;
    let schools = SchoolService::list_schools(&state.db, filters).await?;
    Ok(Json(schools))
}

#[utoipa::path(
    get,
    path = "/api/schools/{id}",
    params(("id" = Uuid, Path, description = "School ID")),
    responses(
        (status = 200, description = "School details", body = School),
        (status = 404, description = "School not found", body = ErrorResponse)
    ),
    tag = "Schools"
)]
pub async fn get_school(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<School>, AppError> {
    let school = SchoolService::get_school(&state.db, state.cache(), id).await?;
    Ok(Json(school))
}

#[utoipa::path(
    patch,
    path = "/api/schools/{id}",
    params(("id" = Uuid, Path, description = "School ID")),
    request_body = UpdateSchoolDto,
    responses(
        (status = 200, description = "School updated", body = School),
        (status = 404, description = "School not found", body = ErrorResponse),
        (status = 409, description = "School name already exists", body = ErrorResponse)
    ),
    tag = "Schools"
)]
pub async fn update_school(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateSchoolDto>,
) -> Result<Json<School>, AppError> {
    let school = SchoolService::update_school(&state.db, state.cache(), id, dto).await?;
    Ok(Json(school))
}

#[utoipa::path(
    delete,
    path = "/api/schools/{id}",
    params(("id" = Uuid, Path, description = "School ID")),
    responses(
        (status = 204, description = "School and its roster deleted"),
        (status = 404, description = "School not found", body = ErrorResponse),
        (status = 409, description = "School has enrollments", body = ErrorResponse)
    ),
    tag = "Schools"
)]
pub async fn delete_school(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    SchoolService::delete_school(&state.db, state.cache(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/schools/{id}/students",
    params(("id" = Uuid, Path, description = "School ID")),
    request_body = CreateSchoolStudentDto,
    responses(
        (status = 201, description = "Student added with a STU system id", body = SchoolStudent),
        (status = 404, description = "School not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "Schools"
)]
pub async fn add_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<CreateSchoolStudentDto>,
) -> Result<(StatusCode, Json<SchoolStudent>), AppError> {
    let student = SchoolService::add_student(&state.db, &state.id_generator, id, dto).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

#[utoipa::path(
    get,
    path = "/api/schools/{id}/students",
    params(
        ("id" = Uuid, Path, description = "School ID"),
        ("limit" = Option<i64>, Query, description = "Limit number of results"),
        ("offset" = Option<i64>, Query, description = "Offset for pagination"),
        ("page" = Option<i64>, Query, description = "Page number (overrides offset)")
    ),
    responses(
        (status = 200, description = "School roster", body = PaginatedSchoolStudentsResponse),
        (status = 404, description = "School not found", body = ErrorResponse)
    ),
    tag = "Schools"
)]
pub async fn list_students(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    pagination: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<PaginatedSchoolStudentsResponse>, AppError> {
    let Query(pagination) = pagination
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;
    let students = SchoolService::list_students(&state.db, id, pagination).await?;
    Ok(Json(students))
}

#[utoipa::path(
    delete,
    path = "/api/schools/{id}/students/{student_id}",
    params(
        ("id" = Uuid, Path, description = "School ID"),
        ("student_id" = Uuid, Path, description = "School student ID")
    ),
    responses(
        (status = 204, description = "Student removed"),
        (status = 404, description = "Student not found in school", body = ErrorResponse)
    ),
    tag = "Schools"
)]
pub async fn remove_student(
    State(state): State<AppState>,
    Path((id, student_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    SchoolService::remove_student(&state.db, state.cache(), id, student_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
