use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::resolve_system_id;

pub fn init_system_ids_router() -> Router<AppState> {
    Router::new().route("/{system_id}", get(resolve_system_id))
}
