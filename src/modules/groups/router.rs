use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{create_group, get_group, list_groups, list_member_enrollments};

pub fn init_groups_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_group).get(list_groups))
        .route("/{id}", get(get_group))
        .route("/{id}/enrollments", get(list_member_enrollments))
}
