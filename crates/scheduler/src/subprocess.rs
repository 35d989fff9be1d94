//! Subprocess execution for scheduler CLIs.
//!
//! Spawns the command with stdin closed, captures stdout/stderr, and kills
//! the child if it outlives the timeout.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::client::SchedulerError;

/// Maximum stdout or stderr size captured per stream (1 MiB).
const MAX_OUTPUT_BYTES: u64 = 1024 * 1024;

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Run `program` with `args`, bounded by `timeout`.
///
/// Arguments are passed as separate argv entries; nothing is interpreted
/// by a shell.
pub async fn run_command(
    program: &str,
    args: &[String],
    timeout: Duration,
) -> Result<CommandOutput, SchedulerError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();
    let mut child = cmd.spawn().map_err(|source| SchedulerError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    // Exit and both pipes share one deadline: a background process that
    // inherited stdout keeps the pipe open after the child exits.
    let finished = async {
        let (status, stdout_bytes, stderr_bytes) = tokio::join!(
            child.wait(),
            read_stream(stdout_handle),
            read_stream(stderr_handle),
        );
        status.map(|status| (status, stdout_bytes, stderr_bytes))
    };

    match tokio::time::timeout(timeout, finished).await {
        Ok(Ok((status, stdout_bytes, stderr_bytes))) => {
            let output = CommandOutput {
                stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
                stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
                exit_code: status.code(),
                duration_ms: start.elapsed().as_millis() as u64,
            };
            tracing::debug!(
                program,
                exit_code = ?output.exit_code,
                duration_ms = output.duration_ms,
                "Scheduler command finished",
            );
            Ok(output)
        }
        Ok(Err(source)) => Err(SchedulerError::Spawn {
            program: program.to_string(),
            source,
        }),
        // `child` is dropped here and killed via `kill_on_drop`.
        Err(_elapsed) => Err(SchedulerError::Timeout {
            program: program.to_string(),
            timeout_secs: timeout.as_secs(),
        }),
    }
}

/// Like [`run_command`], but a non-zero exit becomes
/// [`SchedulerError::ExitStatus`].
pub async fn run_checked(
    program: &str,
    args: &[String],
    timeout: Duration,
) -> Result<CommandOutput, SchedulerError> {
    let output = run_command(program, args, timeout).await?;
    if output.success() {
        Ok(output)
    } else {
        Err(SchedulerError::ExitStatus {
            program: program.to_string(),
            exit_code: output.exit_code,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h).take(MAX_OUTPUT_BYTES).read_to_end(&mut buf).await;
    }
    buf
}
