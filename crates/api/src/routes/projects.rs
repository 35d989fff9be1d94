//! Route definitions for the `/projects` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::projects;
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                 -> list
/// POST   /                 -> create
/// POST   /reconcile        -> reconcile
/// GET    /{slug}           -> get_by_slug
/// PUT    /{slug}           -> rename
/// DELETE /{slug}           -> delete
/// GET    /{slug}/files     -> list_files
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(projects::list).post(projects::create))
        .route("/reconcile", post(projects::reconcile))
        .route(
            "/{slug}",
            get(projects::get_by_slug)
                .put(projects::rename)
                .delete(projects::delete),
        )
        .route("/{slug}/files", get(projects::list_files))
}
