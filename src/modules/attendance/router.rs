use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    attendance_summary, list_attendance, record_attendance, record_bulk_attendance,
};

pub fn init_attendance_router() -> Router<AppState> {
    Router::new()
        .route("/", post(record_attendance))
        .route("/bulk", post(record_bulk_attendance))
        .route("/enrollments/{enrollment_id}", get(list_attendance))
        .route("/enrollments/{enrollment_id}/summary", get(attendance_summary))
}
