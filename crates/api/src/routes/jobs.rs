//! Route definitions for job state and scheduler accounts.

use axum::routing::get;
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at the `/api` root.
///
/// ```text
/// GET /job_state/{job_id}   -> job_state
/// GET /accounts             -> list_accounts
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/job_state/{job_id}", get(jobs::job_state))
        .route("/accounts", get(jobs::list_accounts))
}
