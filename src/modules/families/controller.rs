use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use learnhub_core::{AppError, ErrorResponse};
use learnhub_models::families::{
    AddFamilyMemberDto, CreateFamilyDto, Family, FamilyMember, FamilyWithMembers,
};
use uuid::Uuid;

use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::FamilyService;

#[utoipa::path(
    post,
    path = "/api/families",
    request_body = CreateFamilyDto,
    responses(
        (status = 201, description = "Family created with a FAM system id", body = Family),
        (status = 404, description = "Guardian user not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "Families"
)]
pub async fn create_family(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateFamilyDto>,
) -> Result<(StatusCode, Json<Family>), AppError> {
    let family = FamilyService::create_family(&state.db, &state.id_generator, dto).await?;
    Ok((StatusCode::CREATED, Json(family)))
}

#[utoipa::path(
    get,
    path = "/api/families/{id}",
    params(("id" = Uuid, Path, description = "Family ID")),
    responses(
        (status = 200, description = "Family with its members", body = FamilyWithMembers),
        (status = 404, description = "Family not found", body = ErrorResponse)
    ),
    tag = "Families"
)]
pub async fn get_family(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FamilyWithMembers>, AppError> {
    let family = FamilyService::get_family(&state.db, id).await?;
    Ok(Json(family))
}

#[utoipa::path(
    post,
    path = "/api/families/{id}/members",
    params(("id" = Uuid, Path, description = "Family ID")),
    request_body = AddFamilyMemberDto,
    responses(
        (status = 201, description = "Member added with a STU system id", body = FamilyMember),
        (status = 404, description = "Family not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "Families"
)]
pub async fn add_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<AddFamilyMemberDto>,
) -> Result<(StatusCode, Json<FamilyMember>), AppError> {
    let member = FamilyService::add_member(&state.db, &state.id_generator, id, dto).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

#[utoipa::path(
    delete,
    path = "/api/families/{id}/members/{member_id}",
    params(
        ("id" = Uuid, Path, description = "Family ID"),
        ("member_id" = Uuid, Path, description = "Family member ID")
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 404, description = "Family member not found", body = ErrorResponse)
    ),
    tag = "Families"
)]
pub async fn remove_member(
    State(state): State<AppState>,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    FamilyService::remove_member(&state.db, state.cache(), id, member_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
