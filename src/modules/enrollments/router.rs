use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_enrollment, get_enrollment, list_enrollments, transition_enrollment,
};

pub fn init_enrollments_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_enrollment).get(list_enrollments))
        .route("/{id}", get(get_enrollment))
        .route("/{id}/{action}", post(transition_enrollment))
}
