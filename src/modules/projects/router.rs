use axum::{
    Router, middleware,
    routing::{get, post},
};
use learnhub_cache::{CacheControl, cache_control, etag_middleware};

use crate::state::AppState;

use super::controller::{
    create_project, delete_project, feature_project, get_project, list_projects,
    publish_project, showcase, unfeature_project, unpublish_project, update_project,
};

pub fn init_projects_router() -> Router<AppState> {
    let public = Router::new()
        .route("/showcase", get(showcase))
        .layer(middleware::from_fn(etag_middleware))
        .layer(cache_control(
            CacheControl::public(60).with_stale_while_revalidate(300),
        ));

    Router::new()
        .route("/", post(create_project).get(list_projects))
        .route(
            "/{id}",
            get(get_project).patch(update_project).delete(delete_project),
        )
        .route("/{id}/publish", post(publish_project))
        .route("/{id}/unpublish", post(unpublish_project))
        .route("/{id}/feature", post(feature_project))
        .route("/{id}/unfeature", post(unfeature_project))
        .merge(public)
}
