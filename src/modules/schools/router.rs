use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

use super::controller::{
    add_student, create_school, delete_school, get_school, list_schools, list_students,
    remove_student, update_school,
};

pub fn init_schools_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_school).get(list_schools))
        .route(
            "/{id}",
            get(get_school).patch(update_school).delete(delete_school),
        )
        .route("/{id}/students", post(add_student).get(list_students))
        .route("/{id}/students/{student_id}", delete(remove_student))
}
