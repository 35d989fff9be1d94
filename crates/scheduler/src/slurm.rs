//! [`SchedulerClient`] backed by the Slurm command-line tools.

use std::time::Duration;

use async_trait::async_trait;

use crate::client::{parse_job_id, SchedulerClient, SchedulerError, SubmitSpec};
use crate::subprocess::{run_checked, run_command};

/// Default path of the submission binary.
pub const DEFAULT_SUBMIT_BIN: &str = "/bin/sbatch";

/// Default path of the queue query binary.
pub const DEFAULT_STATUS_BIN: &str = "/bin/squeue";

/// Default bound on any single scheduler command.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Shells out to `sbatch` / `squeue` (or compatible binaries).
#[derive(Debug, Clone)]
pub struct SlurmClient {
    submit_bin: String,
    status_bin: String,
    timeout: Duration,
}

impl Default for SlurmClient {
    fn default() -> Self {
        Self::new(DEFAULT_SUBMIT_BIN, DEFAULT_STATUS_BIN, DEFAULT_TIMEOUT)
    }
}

impl SlurmClient {
    pub fn new(submit_bin: impl Into<String>, status_bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            submit_bin: submit_bin.into(),
            status_bin: status_bin.into(),
            timeout,
        }
    }

    /// Arguments for the queue query: `-j <id> -h -o %t`.
    pub fn status_args(job_id: &str) -> Vec<String> {
        vec![
            "-j".to_string(),
            job_id.to_string(),
            "-h".to_string(),
            "-o".to_string(),
            "%t".to_string(),
        ]
    }
}

#[async_trait]
impl SchedulerClient for SlurmClient {
    async fn submit(&self, spec: &SubmitSpec) -> Result<String, SchedulerError> {
        let args = spec.to_args();
        tracing::info!(
            program = %self.submit_bin,
            job_name = %spec.job_name,
            account = %spec.account,
            "Submitting batch job",
        );
        let output = run_checked(&self.submit_bin, &args, self.timeout).await?;
        parse_job_id(&output.stdout)
    }

    /// `squeue` exits non-zero with nothing on stdout once a job has left
    /// the queue ("Invalid job id specified"); that reads as the empty code.
    async fn query_state(&self, job_id: &str) -> Result<String, SchedulerError> {
        let output = run_command(&self.status_bin, &Self::status_args(job_id), self.timeout).await?;
        let code = output.stdout.trim();

        if !output.success() && !code.is_empty() {
            return Err(SchedulerError::ExitStatus {
                program: self.status_bin.clone(),
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        if !output.success() {
            tracing::debug!(
                job_id = %job_id,
                exit_code = ?output.exit_code,
                stderr = %output.stderr.trim(),
                "Job no longer in queue",
            );
        }
        Ok(code.to_string())
    }
}
