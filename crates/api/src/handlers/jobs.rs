//! Handlers for job state lookups and scheduler accounts.

use axum::extract::{Path, State};
use axum::Json;
use blendfarm_core::job_state::DomainState;
use serde::Serialize;

use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `GET /api/job_state/{job_id}`. Not wrapped in the data envelope.
#[derive(Debug, Serialize)]
pub struct JobStateResponse {
    pub job_state: DomainState,
}

/// GET /api/job_state/{job_id}
///
/// Never fails: scheduler errors resolve to `Unknown`.
pub async fn job_state(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Json<JobStateResponse> {
    let status = state.resolver.resolve(&job_id).await;
    Json(JobStateResponse {
        job_state: status.state,
    })
}

/// GET /api/accounts
pub async fn list_accounts(State(state): State<AppState>) -> Json<DataResponse<Vec<String>>> {
    Json(DataResponse {
        data: state.accounts.as_ref().clone(),
    })
}
