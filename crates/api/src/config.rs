use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use blendfarm_core::render::{RenderLimits, DEFAULT_MAX_CPUS, DEFAULT_MAX_WALLTIME_HOURS};
use blendfarm_scheduler::slurm::{DEFAULT_STATUS_BIN, DEFAULT_SUBMIT_BIN};
use blendfarm_scheduler::SubmitSettings;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `120`). Uploads of large
    /// scene files need the headroom.
    pub request_timeout_secs: u64,
    /// Directory holding one subdirectory per project.
    pub project_root: PathBuf,
    /// Delete orphaned project directories before answering a list request.
    pub reconcile_on_list: bool,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
    pub scheduler: SchedulerConfig,
    pub limits: RenderLimits,
}

/// How the server reaches the batch scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub submit_bin: String,
    pub status_bin: String,
    /// Value passed to `-M`.
    pub cluster: String,
    /// Upper bound on any single scheduler subprocess.
    pub timeout_secs: u64,
    pub frame_render_script: PathBuf,
    pub video_render_script: PathBuf,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                    |
    /// |--------------------------|----------------------------|
    /// | `HOST`                   | `0.0.0.0`                  |
    /// | `PORT`                   | `3000`                     |
    /// | `CORS_ORIGINS`           | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`   | `120`                      |
    /// | `PROJECT_ROOT`           | `./projects`               |
    /// | `RECONCILE_ON_LIST`      | `true`                     |
    /// | `MAX_UPLOAD_BYTES`       | `2147483648`               |
    /// | `SCHEDULER_SUBMIT_BIN`   | `/bin/sbatch`              |
    /// | `SCHEDULER_STATUS_BIN`   | `/bin/squeue`              |
    /// | `SCHEDULER_CLUSTER`      | `pitzer`                   |
    /// | `SCHEDULER_TIMEOUT_SECS` | `60`                       |
    /// | `FRAME_RENDER_SCRIPT`    | `./render_frames.sh`       |
    /// | `VIDEO_RENDER_SCRIPT`    | `./render_video.sh`        |
    /// | `MAX_WALLTIME_HOURS`     | `48`                       |
    /// | `MAX_CPUS`               | `48`                       |
    ///
    /// Panics on unparseable values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let scheduler = SchedulerConfig {
            submit_bin: env_or("SCHEDULER_SUBMIT_BIN", DEFAULT_SUBMIT_BIN),
            status_bin: env_or("SCHEDULER_STATUS_BIN", DEFAULT_STATUS_BIN),
            cluster: env_or("SCHEDULER_CLUSTER", "pitzer"),
            timeout_secs: env_parse("SCHEDULER_TIMEOUT_SECS", 60),
            frame_render_script: env_or("FRAME_RENDER_SCRIPT", "./render_frames.sh").into(),
            video_render_script: env_or("VIDEO_RENDER_SCRIPT", "./render_video.sh").into(),
        };

        let limits = RenderLimits {
            max_cpus: env_parse("MAX_CPUS", DEFAULT_MAX_CPUS),
            max_hours: env_parse("MAX_WALLTIME_HOURS", DEFAULT_MAX_WALLTIME_HOURS),
        };

        Self {
            host,
            port: env_parse("PORT", 3000),
            cors_origins,
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", 120),
            project_root: env_or("PROJECT_ROOT", "./projects").into(),
            reconcile_on_list: env_parse("RECONCILE_ON_LIST", true),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES", 2 * 1024 * 1024 * 1024),
            scheduler,
            limits,
        }
    }

    /// Settings handed to the job submitter.
    pub fn submit_settings(&self) -> SubmitSettings {
        SubmitSettings {
            cluster: self.scheduler.cluster.clone(),
            frame_script: self.scheduler.frame_render_script.clone(),
            video_script: self.scheduler.video_render_script.clone(),
            limits: self.limits,
        }
    }

    pub fn scheduler_timeout(&self) -> Duration {
        Duration::from_secs(self.scheduler.timeout_secs)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}
