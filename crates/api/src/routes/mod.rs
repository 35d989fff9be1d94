pub mod health;
pub mod jobs;
pub mod projects;
pub mod render;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /job_state/{job_id}                  resolved job state (GET)
/// /accounts                            scheduler accounts (GET)
///
/// /projects                            list, create
/// /projects/reconcile                  delete orphaned directories (POST)
/// /projects/{slug}                     view, rename, delete
/// /projects/{slug}/files               output files (GET)
///
/// /input_files                         uploaded .blend files (GET)
/// /render/frames                       submit frame render (POST, multipart)
/// /render/video                        submit video render (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(jobs::router())
        .nest("/projects", projects::router())
        .merge(render::router())
}
