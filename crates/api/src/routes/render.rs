//! Route definitions for render submission and uploaded scene files.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::render;
use crate::state::AppState;

/// Routes mounted at the `/api` root.
///
/// ```text
/// GET  /input_files       -> list_input_files
/// POST /render/frames     -> submit_frames (multipart)
/// POST /render/video      -> submit_video
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/input_files", get(render::list_input_files))
        .route("/render/frames", post(render::submit_frames))
        .route("/render/video", post(render::submit_video))
}
