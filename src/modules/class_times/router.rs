use axum::{
    Router,
    routing::{patch, post},
};

use crate::state::AppState;

use super::controller::{
    create_class_time, delete_class_time, list_class_times, update_class_time,
};

pub fn init_class_times_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_class_time).get(list_class_times))
        .route("/{id}", patch(update_class_time).delete(delete_class_time))
}
