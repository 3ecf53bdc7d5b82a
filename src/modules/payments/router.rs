use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    list_enrollment_payments, list_pending_payments, reject_payment, submit_payment,
    verify_payment,
};

pub fn init_payments_router() -> Router<AppState> {
    Router::new()
        .route("/pending", get(list_pending_payments))
        .route(
            "/enrollments/{enrollment_id}",
            post(submit_payment).get(list_enrollment_payments),
        )
        .route("/{id}/verify", post(verify_payment))
        .route("/{id}/reject", post(reject_payment))
}
