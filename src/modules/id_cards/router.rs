use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_governor::GovernorLayer;

use crate::state::AppState;

use super::controller::{
    get_card, issue_cards, list_cards, resolve_card, revoke_card, scan_card,
};

/// Card management plus the public scan endpoints, which get their own
/// per-IP limit when rate limiting is enabled.
pub fn init_id_cards_router(state: &AppState) -> Router<AppState> {
    let mut public = Router::new()
        .route("/scan/{token}", get(scan_card))
        .route("/resolve/{token}", get(resolve_card));

    if state.rate_limit_config.enabled
        && let Some(config) = state.rate_limit_config.scan_governor_config()
    {
        public = public.layer(GovernorLayer::new(Arc::new(config)));
    }

    Router::new()
        .route("/enrollments/{enrollment_id}", post(issue_cards).get(list_cards))
        .route("/{id}", get(get_card))
        .route("/{id}/revoke", post(revoke_card))
        .merge(public)
}
