use std::sync::Arc;

use crate::docs::ApiDoc;
use crate::modules::attendance::router::init_attendance_router;
use crate::modules::class_times::router::init_class_times_router;
use crate::modules::enrollments::router::init_enrollments_router;
use crate::modules::families::router::init_families_router;
use crate::modules::groups::router::init_groups_router;
use crate::modules::id_cards::router::init_id_cards_router;
use crate::modules::materials::router::init_materials_router;
use crate::modules::payments::router::init_payments_router;
use crate::modules::projects::router::init_projects_router;
use crate::modules::schools::router::init_schools_router;
use crate::modules::system_ids::router::init_system_ids_router;
use crate::modules::users::router::init_users_router;
use crate::state::AppState;
use axum::http::{HeaderValue, Method};
use axum::{Router, middleware};
use learnhub_observability::{logging_middleware, metrics_middleware};
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

pub fn init_router(state: AppState) -> Router {
    let mut api = Router::new()
        .nest("/users", init_users_router())
        .nest("/schools", init_schools_router())
        .nest("/families", init_families_router())
        .nest("/groups", init_groups_router())
        .nest("/enrollments", init_enrollments_router())
        .nest("/payments", init_payments_router())
        .nest("/class-times", init_class_times_router())
        .nest("/attendance", init_attendance_router())
        .nest("/materials", init_materials_router())
        .nest("/id-cards", init_id_cards_router(&state))
        .nest("/projects", init_projects_router())
        .nest("/system-ids", init_system_ids_router());

    if state.rate_limit_config.enabled
        && let Some(config) = state.rate_limit_config.general_governor_config()
    {
        api = api.layer(GovernorLayer::new(Arc::new(config)));
    }

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .nest("/api", api)
        .with_state(state.clone())
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                    axum::http::header::IF_NONE_MATCH,
                ])
        })
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
}
