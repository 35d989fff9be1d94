//! Resolves job ids to domain states.
//!
//! Always asks the scheduler; nothing is cached. Failures never propagate:
//! a query that errors resolves to `Unknown`.

use std::sync::Arc;

use blendfarm_core::job_state::{DomainState, JobStatus};

use crate::client::{is_job_token, SchedulerClient};

#[derive(Clone)]
pub struct JobStatusResolver {
    client: Arc<dyn SchedulerClient>,
}

impl JobStatusResolver {
    pub fn new(client: Arc<dyn SchedulerClient>) -> Self {
        Self { client }
    }

    /// Resolve `job_id` to a state and badge.
    ///
    /// An empty id is `NotStarted` and the scheduler is not contacted.
    pub async fn resolve(&self, job_id: &str) -> JobStatus {
        if job_id.is_empty() {
            return JobStatus::not_started();
        }
        if !is_job_token(job_id) {
            tracing::debug!(job_id = %job_id, "Malformed job id, not querying scheduler");
            return JobStatus::from(DomainState::Unknown);
        }

        let state = match self.client.query_state(job_id).await {
            Ok(code) => DomainState::from_scheduler_code(code.trim()),
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "Job state query failed");
                DomainState::Unknown
            }
        };
        JobStatus::from(state)
    }
}
