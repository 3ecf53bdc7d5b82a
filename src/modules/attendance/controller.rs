use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use learnhub_core::{AppError, ErrorResponse};
use learnhub_models::attendance::{
    AttendanceRangeParams, AttendanceRecord, AttendanceSummary, BulkAttendanceDto,
    RecordAttendanceDto,
};
use uuid::Uuid;

use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::AttendanceService;

fn range_params(
    query: Result<Query<AttendanceRangeParams>, QueryRejection>,
) -> Result<AttendanceRangeParams, AppError> {
    query
        .map(|Query(range)| range)
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))
}

#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = RecordAttendanceDto,
    responses(
        (status = 200, description = "Attendance recorded or corrected", body = AttendanceRecord),
        (status = 404, description = "Enrollment or class time not found", body = ErrorResponse),
        (status = 409, description = "Enrollment is not approved", body = ErrorResponse)
    ),
    tag = "Attendance"
)]
pub async fn record_attendance(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RecordAttendanceDto>,
) -> Result<Json<AttendanceRecord>, AppError> {
    let record = AttendanceService::record_attendance(&state.db, dto).await?;
    Ok(Json(record))
}

#[utoipa::path(
    post,
    path = "/api/attendance/bulk",
    request_body = BulkAttendanceDto,
    responses(
        (status = 200, description = "All entries recorded", body = Vec<AttendanceRecord>),
        (status = 404, description = "An enrollment was not found", body = ErrorResponse),
        (status = 409, description = "An enrollment is not approved", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "Attendance"
)]
pub async fn record_bulk_attendance(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<BulkAttendanceDto>,
) -> Result<Json<Vec<AttendanceRecord>>, AppError> {
    let records = AttendanceService::record_bulk(&state.db, dto).await?;
    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/api/attendance/enrollments/{enrollment_id}",
    params(
        ("enrollment_id" = Uuid, Path, description = "Enrollment ID"),
        ("from" = Option<String>, Query, description = "First class date (YYYY-MM-DD)"),
        ("to" = Option<String>, Query, description = "Last class date (YYYY-MM-DD)")
    ),
    responses(
        (status = 200, description = "Attendance ordered by date", body = Vec<AttendanceRecord>),
        (status = 400, description = "Invalid date range", body = ErrorResponse),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    State(state): State<AppState>,
    Path(enrollment_id): Path<Uuid>,
    range: Result<Query<AttendanceRangeParams>, QueryRejection>,
) -> Result<Json<Vec<AttendanceRecord>>, AppError> {
    let range = range_params(range)?;
    let records = AttendanceService::list_for_enrollment(&state.db, enrollment_id, range).await?;
    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/api/attendance/enrollments/{enrollment_id}/summary",
    params(
        ("enrollment_id" = Uuid, Path, description = "Enrollment ID"),
        ("from" = Option<String>, Query, description = "First class date (YYYY-MM-DD)"),
        ("to" = Option<String>, Query, description = "Last class date (YYYY-MM-DD)")
    ),
    responses(
        (status = 200, description = "Counts per status and attendance rate", body = AttendanceSummary),
        (status = 400, description = "Invalid date range", body = ErrorResponse),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    tag = "Attendance"
)]
pub async fn attendance_summary(
    State(state): State<AppState>,
    Path(enrollment_id): Path<Uuid>,
    range: Result<Query<AttendanceRangeParams>, QueryRejection>,
) -> Result<Json<AttendanceSummary>, AppError> {
    let range = range_params(range)?;
    let summary = AttendanceService::summary(&state.db, enrollment_id, range).await?;
    Ok(Json(summary))
}
