use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use learnhub_core::{AppError, ErrorResponse};
use learnhub_models::materials::{
    CreateMaterialDto, LearningMaterial, MaterialFilterParams, PaginatedMaterialsResponse,
    UpdateMaterialDto,
};
use uuid::Uuid;

use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::MaterialService;

#[utoipa::path(
    post,
    path = "/api/materials",
    request_body = CreateMaterialDto,
    responses(
        (status = 201, description = "Learning material created", body = LearningMaterial),
        (status = 404, description = "Group class or school not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "Learning Materials"
)]
pub async fn create_material(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateMaterialDto>,
) -> Result<(StatusCode, Json<LearningMaterial>), AppError> {
    let material = MaterialService::create_material(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(material)))
}

#[utoipa::path(
    get,
    path = "/api/materials",
    params(
        ("class_name" = Option<String>, Query, description = "Exact class name"),
        ("material_type" = Option<String>, Query, description = "document, video, link or assignment"),
        ("is_published" = Option<bool>, Query, description = "Filter by published flag"),
        ("group_class_id" = Option<Uuid>, Query, description = "Scoped to a group class"),
        ("school_id" = Option<Uuid>, Query, description = "Scoped to a school"),
        ("limit" = Option<i64>, Query, description = "Limit number of results"),
        ("offset" = Option<i64>, Query, description = "Offset for pagination"),
        ("page" = Option<i64>, Query, description = "Page number (overrides offset)")
    ),
    responses(
        (status = 200, description = "Paginated list of materials", body = PaginatedMaterialsResponse),
        (status = 304, description = "Not modified (ETag matched)"),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse)
    ),
    tag = "Learning Materials"
)]
pub async fn list_materials(
    State(state): State<AppState>,
    filters: Result<Query<MaterialFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedMaterialsResponse>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;
    let materials = MaterialService::list_materials(&state.db, filters).await?;
    Ok(Json(materials))
}

#[utoipa::path(
    get,
    path = "/api/materials/{id}",
    params(("id" = Uuid, Path, description = "Learning material ID")),
    responses(
        (status = 200, description = "Learning material", body = LearningMaterial),
        (status = 304, description = "Not modified (ETag matched)"),
        (status = 404, description = "Learning material not found", body = ErrorResponse)
    ),
    tag = "Learning Materials"
)]
pub async fn get_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LearningMaterial>, AppError> {
    let material = MaterialService::get_material(&state.db, id).await?;
    Ok(Json(material))
}

#[utoipa::path(
    patch,
    path = "/api/materials/{id}",
    params(("id" = Uuid, Path, description = "Learning material ID")),
    request_body = UpdateMaterialDto,
    responses(
        (status = 200, description = "Learning material updated", body = LearningMaterial),
        (status = 404, description = "Learning material not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "Learning Materials"
)]
pub async fn update_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateMaterialDto>,
) -> Result<Json<LearningMaterial>, AppError> {
    let material = MaterialService::update_material(&state.db, id, dto).await?;
    Ok(Json(material))
}

#[utoipa::path(
    delete,
    path = "/api/materials/{id}",
    params(("id" = Uuid, Path, description = "Learning material ID")),
    responses(
        (status = 204, description = "Learning material deleted"),
        (status = 404, description = "Learning material not found", body = ErrorResponse)
    ),
    tag = "Learning Materials"
)]
pub async fn delete_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    MaterialService::delete_material(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/materials/enrollments/{enrollment_id}",
    params(("enrollment_id" = Uuid, Path, description = "Enrollment ID")),
    responses(
        (status = 200, description = "Published materials available to the enrollment", body = Vec<LearningMaterial>),
        (status = 304, description = "Not modified (ETag matched)"),
        (status = 404, description = "Enrollment not found", body = ErrorResponse),
        (status = 409, description = "Enrollment is not approved", body = ErrorResponse)
    ),
    tag = "Learning Materials"
)]
pub async fn materials_for_enrollment(
    State(state): State<AppState>,
    Path(enrollment_id): Path<Uuid>,
) -> Result<Json<Vec<LearningMaterial>>, AppError> {
    let materials = MaterialService::materials_for_enrollment(&state.db, enrollment_id).await?;
    Ok(Json(materials))
}
