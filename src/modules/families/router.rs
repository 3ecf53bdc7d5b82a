use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

use super::controller::{add_member, create_family, get_family, remove_member};

pub fn init_families_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_family))
        .route("/{id}", get(get_family))
        .route("/{id}/members", post(add_member))
        .route("/{id}/members/{member_id}", delete(remove_member))
}
