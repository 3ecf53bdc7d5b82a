use axum::{
    Router, middleware,
    routing::{get, patch, post},
};
use learnhub_cache::{CacheControl, cache_control, etag_middleware};

use crate::state::AppState;

use super::controller::{
    create_material, delete_material, get_material, list_materials, materials_for_enrollment,
    update_material,
};

pub fn init_materials_router() -> Router<AppState> {
    let reads = Router::new()
        .route("/", get(list_materials))
        .route("/{id}", get(get_material))
        .route("/enrollments/{enrollment_id}", get(materials_for_enrollment))
        .layer(middleware::from_fn(etag_middleware))
        .layer(cache_control(CacheControl::private(60)));

    let writes = Router::new()
        .route("/", post(create_material))
        .route("/{id}", patch(update_material).delete(delete_material));

    reads.merge(writes)
}
