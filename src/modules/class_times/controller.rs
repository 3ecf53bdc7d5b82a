use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use learnhub_core::{AppError, ErrorResponse};
use learnhub_models::class_times::{
    ClassTime, ClassTimeFilterParams, CreateClassTimeDto, UpdateClassTimeDto,
};
use uuid::Uuid;

use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::ClassTimeService;

#[utoipa::path(
    post,
    path = "/api/class-times",
    request_body = CreateClassTimeDto,
    responses(
        (status = 201, description = "Class time created", body = ClassTime),
        (status = 404, description = "Group class not found", body = ErrorResponse),
        (status = 409, description = "Overlaps another slot of the class", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "Class Times"
)]
pub async fn create_class_time(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateClassTimeDto>,
) -> Result<(StatusCode, Json<ClassTime>), AppError> {
    let class_time = ClassTimeService::create_class_time(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(class_time)))
}

#[utoipa::path(
    get,
    path = "/api/class-times",
    params(
        ("class_name" = Option<String>, Query, description = "Exact class name"),
        ("group_class_id" = Option<Uuid>, Query, description = "Group class ID"),
        ("day_of_week" = Option<i16>, Query, description = "0 (Monday) to 6 (Sunday)")
    ),
    responses(
        (status = 200, description = "Class times ordered by day and start time", body = Vec<ClassTime>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse)
    ),
    tag = "Class Times"
)]
pub async fn list_class_times(
    State(state): State<AppState>,
    filters: Result<Query<ClassTimeFilterParams>, QueryRejection>,
) -> Result<Json<Vec<ClassTime>>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;
    let class_times = ClassTimeService::list_class_times(&state.db, filters).await?;
    Ok(Json(class_times))
}

#[utoipa::path(
    patch,
    path = "/api/class-times/{id}",
    params(("id" = Uuid, Path, description = "Class time ID")),
    request_body = UpdateClassTimeDto,
    responses(
        (status = 200, description = "Class time updated", body = ClassTime),
        (status = 404, description = "Class time not found", body = ErrorResponse),
        (status = 409, description = "Overlaps another slot of the class", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "Class Times"
)]
pub async fn update_class_time(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateClassTimeDto>,
) -> Result<Json<ClassTime>, AppError> {
    let class_time = ClassTimeService::update_class_time(&state.db, id, dto).await?;
    Ok(Json(class_time))
}

#[utoipa::path(
    delete,
    path = "/api/class-times/{id}",
    params(("id" = Uuid, Path, description = "Class time ID")),
    responses(
        (status = 204, description = "Class time deleted"),
        (status = 404, description = "Class time not found", body = ErrorResponse)
    ),
    tag = "Class Times"
)]
pub async fn delete_class_time(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ClassTimeService::delete_class_time(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
