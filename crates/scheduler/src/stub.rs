//! Programmable in-memory scheduler for tests and local development.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{SchedulerClient, SchedulerError, SubmitSpec};

/// First id handed out when no submission outcome was programmed.
const FIRST_AUTO_JOB_ID: u64 = 1000;

enum SubmitOutcome {
    Accept(String),
    Reject(String),
}

/// A [`SchedulerClient`] whose answers are set up by the test.
///
/// - Submissions return programmed outcomes in order, then sequential ids.
/// - State queries return the code set via [`set_state`](Self::set_state);
///   unknown ids fail like a real queue query for a purged job.
pub struct StubScheduler {
    submit_outcomes: Mutex<VecDeque<SubmitOutcome>>,
    states: Mutex<HashMap<String, Option<String>>>,
    submissions: Mutex<Vec<SubmitSpec>>,
    queries: AtomicUsize,
    next_id: AtomicU64,
}

impl Default for StubScheduler {
    fn default() -> Self {
        Self {
            submit_outcomes: Mutex::new(VecDeque::new()),
            states: Mutex::new(HashMap::new()),
            submissions: Mutex::new(Vec::new()),
            queries: AtomicUsize::new(0),
            next_id: AtomicU64::new(FIRST_AUTO_JOB_ID),
        }
    }
}

impl StubScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next submission succeeds with `job_id`.
    pub fn push_job_id(&self, job_id: impl Into<String>) {
        lock(&self.submit_outcomes).push_back(SubmitOutcome::Accept(job_id.into()));
    }

    /// The next submission is rejected with `message`.
    pub fn push_rejection(&self, message: impl Into<String>) {
        lock(&self.submit_outcomes).push_back(SubmitOutcome::Reject(message.into()));
    }

    /// Queries for `job_id` return `code`.
    pub fn set_state(&self, job_id: impl Into<String>, code: impl Into<String>) {
        lock(&self.states).insert(job_id.into(), Some(code.into()));
    }

    /// Queries for `job_id` fail.
    pub fn fail_state(&self, job_id: impl Into<String>) {
        lock(&self.states).insert(job_id.into(), None);
    }

    /// Every spec passed to [`SchedulerClient::submit`], in order.
    pub fn submissions(&self) -> Vec<SubmitSpec> {
        lock(&self.submissions).clone()
    }

    /// Number of [`SchedulerClient::query_state`] calls so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchedulerClient for StubScheduler {
    async fn submit(&self, spec: &SubmitSpec) -> Result<String, SchedulerError> {
        lock(&self.submissions).push(spec.clone());
        let outcome = lock(&self.submit_outcomes).pop_front();
        match outcome {
            Some(SubmitOutcome::Accept(id)) => Ok(id),
            Some(SubmitOutcome::Reject(msg)) => Err(SchedulerError::Rejected(msg)),
            None => Ok(self.next_id.fetch_add(1, Ordering::SeqCst).to_string()),
        }
    }

    async fn query_state(&self, job_id: &str) -> Result<String, SchedulerError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        match lock(&self.states).get(job_id) {
            Some(Some(code)) => Ok(code.clone()),
            Some(None) | None => Err(SchedulerError::Rejected(format!(
                "Invalid job id specified: {job_id}"
            ))),
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
