use axum::{
    Json,
    extract::{Path, State},
    response::Redirect,
};
use learnhub_core::{AppError, ErrorResponse};
use learnhub_models::id_cards::{CardResolution, IdCard, IssuedCardsResponse};
use uuid::Uuid;

use crate::state::AppState;

use super::service::IdCardService;

#[utoipa::path(
    post,
    path = "/api/id-cards/enrollments/{enrollment_id}",
    params(("enrollment_id" = Uuid, Path, description = "Enrollment ID")),
    responses(
        (status = 200, description = "Live cards of the enrollment; existing cards are kept", body = IssuedCardsResponse),
        (status = 404, description = "Enrollment not found", body = ErrorResponse),
        (status = 409, description = "Enrollment is not approved", body = ErrorResponse),
        (status = 422, description = "Enrollment has no card holders", body = ErrorResponse)
    ),
    tag = "ID Cards"
)]
pub async fn issue_cards(
    State(state): State<AppState>,
    Path(enrollment_id): Path<Uuid>,
) -> Result<Json<IssuedCardsResponse>, AppError> {
    let issued = IdCardService::issue_cards(
        &state.db,
        &state.id_generator,
        &state.app_config,
        enrollment_id,
    )
    .await?;
    Ok(Json(issued))
}

#[utoipa::path(
    get,
    path = "/api/id-cards/enrollments/{enrollment_id}",
    params(("enrollment_id" = Uuid, Path, description = "Enrollment ID")),
    responses(
        (status = 200, description = "All cards of the enrollment, revoked included", body = Vec<IdCard>),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    tag = "ID Cards"
)]
pub async fn list_cards(
    State(state): State<AppState>,
    Path(enrollment_id): Path<Uuid>,
) -> Result<Json<Vec<IdCard>>, AppError> {
    let cards = IdCardService::list_for_enrollment(&state.db, enrollment_id).await?;
    Ok(Json(cards))
}

#[utoipa::path(
    get,
    path = "/api/id-cards/{id}",
    params(("id" = Uuid, Path, description = "ID card ID")),
    responses(
        (status = 200, description = "ID card", body = IdCard),
        (status = 404, description = "ID card not found", body = ErrorResponse)
    ),
    tag = "ID Cards"
)]
pub async fn get_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<IdCard>, AppError> {
    let card = IdCardService::get_card(&state.db, id).await?;
    Ok(Json(card))
}

#[utoipa::path(
    post,
    path = "/api/id-cards/{id}/revoke",
    params(("id" = Uuid, Path, description = "ID card ID")),
    responses(
        (status = 200, description = "ID card revoked", body = IdCard),
        (status = 404, description = "ID card not found", body = ErrorResponse),
        (status = 409, description = "ID card already revoked", body = ErrorResponse)
    ),
    tag = "ID Cards"
)]
pub async fn revoke_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<IdCard>, AppError> {
    let card = IdCardService::revoke_card(&state.db, state.cache(), id).await?;
    Ok(Json(card))
}

#[utoipa::path(
    get,
    path = "/api/id-cards/scan/{token}",
    params(("token" = String, Path, description = "QR token printed on the card")),
    responses(
        (status = 303, description = "Redirect to the holder's enrollment page"),
        (status = 404, description = "Unknown or revoked card", body = ErrorResponse),
        (status = 429, description = "Too many scans from this address")
    ),
    tag = "ID Cards"
)]
pub async fn scan_card(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Redirect, AppError> {
    let target = IdCardService::scan(&state.db, &state.app_config, &token).await?;
    Ok(Redirect::to(&target))
}

#[utoipa::path(
    get,
    path = "/api/id-cards/resolve/{token}",
    params(("token" = String, Path, description = "QR token printed on the card")),
    responses(
        (status = 200, description = "Card, enrollment and redirect target", body = CardResolution),
        (status = 404, description = "Unknown or revoked card", body = ErrorResponse),
        (status = 429, description = "Too many scans from this address")
    ),
    tag = "ID Cards"
)]
pub async fn resolve_card(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<CardResolution>, AppError> {
    let resolution =
        IdCardService::resolve(&state.db, state.cache(), &state.app_config, &token).await?;
    Ok(Json(resolution))
}
