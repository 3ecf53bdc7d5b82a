use axum::{
    Router,
    routing::{get, post},
};

use crate::modules::projects::controller::list_owner_projects;
use crate::state::AppState;

use super::controller::{
    create_user, deactivate_user, delete_user, get_user, list_users, update_user,
};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user).get(list_users))
        .route(
            "/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/{id}/deactivate", post(deactivate_user))
        .route("/{id}/projects", get(list_owner_projects))
}
