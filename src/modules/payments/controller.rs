use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use learnhub_core::{AppError, ErrorResponse, PaginationParams};
use learnhub_models::payments::{
    MonthlyPayment, PaginatedPaymentsResponse, ReviewPaymentDto, SubmitPaymentDto,
};
use uuid::Uuid;

use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::{PaymentService, Review};

fn pagination_params(
    query: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<PaginationParams, AppError> {
    query
        .map(|Query(params)| params)
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))
}

#[utoipa::path(
    post,
    path = "/api/payments/enrollments/{enrollment_id}",
    params(("enrollment_id" = Uuid, Path, description = "Enrollment ID")),
    request_body = SubmitPaymentDto,
    responses(
        (status = 201, description = "Proof submitted; enrollment payment status is pending_verification", body = MonthlyPayment),
        (status = 404, description = "Enrollment not found", body = ErrorResponse),
        (status = 409, description = "Enrollment inactive or proof already submitted for the month", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn submit_payment(
    State(state): State<AppState>,
    Path(enrollment_id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<SubmitPaymentDto>,
) -> Result<(StatusCode, Json<MonthlyPayment>), AppError> {
    let payment = PaymentService::submit_payment(&state.db, enrollment_id, dto).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

#[utoipa::path(
    get,
    path = "/api/payments/enrollments/{enrollment_id}",
    params(
        ("enrollment_id" = Uuid, Path, description = "Enrollment ID"),
        ("limit" = Option<i64>, Query, description = "Limit number of results"),
        ("offset" = Option<i64>, Query, description = "Offset for pagination"),
        ("page" = Option<i64>, Query, description = "Page number (overrides offset)")
    ),
    responses(
        (status = 200, description = "Payments of the enrollment, newest month first", body = PaginatedPaymentsResponse),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn list_enrollment_payments(
    State(state): State<AppState>,
    Path(enrollment_id): Path<Uuid>,
    pagination: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<PaginatedPaymentsResponse>, AppError> {
    let pagination = pagination_params(pagination)?;
    let payments = PaymentService::list_for_enrollment(&state.db, enrollment_id, pagination).await?;
    Ok(Json(payments))
}

#[utoipa::path(
    get,
    path = "/api/payments/pending",
    params(
        ("limit" = Option<i64>, Query, description = "Limit number of results"),
        ("offset" = Option<i64>, Query, description = "Offset for pagination"),
        ("page" = Option<i64>, Query, description = "Page number (overrides offset)")
    ),
    responses(
        (status = 200, description = "Review queue, oldest submission first", body = PaginatedPaymentsResponse)
    ),
    tag = "Payments"
)]
pub async fn list_pending_payments(
    State(state): State<AppState>,
    pagination: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<PaginatedPaymentsResponse>, AppError> {
    let pagination = pagination_params(pagination)?;
    let payments = PaymentService::list_pending(&state.db, pagination).await?;
    Ok(Json(payments))
}

#[utoipa::path(
    post,
    path = "/api/payments/{id}/verify",
    params(("id" = Uuid, Path, description = "Payment ID")),
    request_body = ReviewPaymentDto,
    responses(
        (status = 200, description = "Proof verified; enrollment marked paid", body = MonthlyPayment),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 409, description = "Payment already reviewed", body = ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<ReviewPaymentDto>,
) -> Result<Json<MonthlyPayment>, AppError> {
    let payment = PaymentService::review_payment(&state.db, id, Review::Verify, dto).await?;
    Ok(Json(payment))
}

#[utoipa::path(
    post,
    path = "/api/payments/{id}/reject",
    params(("id" = Uuid, Path, description = "Payment ID")),
    request_body = ReviewPaymentDto,
    responses(
        (status = 200, description = "Proof rejected; enrollment payment status rejected", body = MonthlyPayment),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 409, description = "Payment already reviewed", body = ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn reject_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<ReviewPaymentDto>,
) -> Result<Json<MonthlyPayment>, AppError> {
    let payment = PaymentService::review_payment(&state.db, id, Review::Reject, dto).await?;
    Ok(Json(payment))
}
