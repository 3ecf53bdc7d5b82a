use axum::{
    Json,
    extract::{Path, State},
};
use learnhub_core::AppError;
use learnhub_models::system_ids::SystemIdResolution;

use crate::state::AppState;

use super::service::SystemIdService;

#[utoipa::path(
    get,
    path = "/api/system-ids/{system_id}",
    params(
        ("system_id" = String, Path, description = "System id such as STU-00042 or FAM-K7QX2")
    ),
    responses(
        (status = 200, description = "Entity the system id belongs to", body = SystemIdResolution),
        (status = 400, description = "Unrecognised system id format", body = learnhub_core::ErrorResponse),
        (status = 404, description = "System id not issued", body = learnhub_core::ErrorResponse)
    ),
    tag = "System IDs"
)]
pub async fn resolve_system_id(
    State(state): State<AppState>,
    Path(system_id): Path<String>,
) -> Result<Json<SystemIdResolution>, AppError> {
    let resolution = SystemIdService::resolve(&state.db, state.cache(), &system_id).await?;
    Ok(Json(resolution))
}
