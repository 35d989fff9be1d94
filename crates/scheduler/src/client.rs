//! The scheduler capability seam and its shared types.

use std::path::PathBuf;

use async_trait::async_trait;

/// Errors from talking to the batch scheduler.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The scheduler binary could not be started.
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The scheduler ran but exited non-zero.
    #[error("{program} exited with code {exit_code:?}: {stderr}")]
    ExitStatus {
        program: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The scheduler did not finish within the configured timeout and was killed.
    #[error("{program} timed out after {timeout_secs}s")]
    Timeout { program: String, timeout_secs: u64 },

    /// Standard output did not have the expected shape.
    #[error("unparseable scheduler output: {0:?}")]
    UnparseableOutput(String),

    /// The scheduler refused the request (used by non-subprocess clients).
    #[error("scheduler rejected request: {0}")]
    Rejected(String),
}

/// Everything needed to submit one batch job.
///
/// [`to_args`](Self::to_args) renders the submission command line:
///
/// ```text
/// -J <name> --parsable --export K1=V1,K2=V2 -n <cpus> -t HH:00:00
///     -M <cluster> --output <pattern> --account <account> <script>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitSpec {
    pub job_name: String,
    /// Environment passed to the job script, in order.
    pub exports: Vec<(String, String)>,
    pub num_cpus: u32,
    /// Walltime token, already formatted as `HH:00:00`.
    pub walltime: String,
    pub cluster: String,
    /// Scheduler log path; `%j` expands to the job id.
    pub output_pattern: String,
    pub account: String,
    pub script: PathBuf,
}

impl SubmitSpec {
    /// The `K1=V1,K2=V2` value of `--export`.
    pub fn export_list(&self) -> String {
        self.exports
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Arguments for the submission binary, one element per argv slot.
    pub fn to_args(&self) -> Vec<String> {
        vec![
            "-J".to_string(),
            self.job_name.clone(),
            "--parsable".to_string(),
            "--export".to_string(),
            self.export_list(),
            "-n".to_string(),
            self.num_cpus.to_string(),
            "-t".to_string(),
            self.walltime.clone(),
            "-M".to_string(),
            self.cluster.clone(),
            "--output".to_string(),
            self.output_pattern.clone(),
            "--account".to_string(),
            self.account.clone(),
            self.script.to_string_lossy().into_owned(),
        ]
    }
}

/// Capability interface over the external batch scheduler.
#[async_trait]
pub trait SchedulerClient: Send + Sync {
    /// Submit a job and return the scheduler-assigned id.
    async fn submit(&self, spec: &SubmitSpec) -> Result<String, SchedulerError>;

    /// Return the raw state code for `job_id`. An empty string means the job
    /// is no longer queued.
    async fn query_state(&self, job_id: &str) -> Result<String, SchedulerError>;
}

/// Whether `job_id` looks like a scheduler job token (`12345`, `12345_7`).
pub fn is_job_token(job_id: &str) -> bool {
    !job_id.is_empty()
        && job_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Extract the job id from `--parsable` output: the first `;`-delimited
/// field of the first non-empty line.
pub fn parse_job_id(stdout: &str) -> Result<String, SchedulerError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| SchedulerError::UnparseableOutput(stdout.to_string()))?;

    let token = line.split(';').next().unwrap_or_default().trim();
    if is_job_token(token) {
        Ok(token.to_string())
    } else {
        Err(SchedulerError::UnparseableOutput(stdout.to_string()))
    }
}
