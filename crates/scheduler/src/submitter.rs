//! Turns render requests into scheduler submissions.
//!
//! Submission has no persistence side effect: the caller records the
//! returned job id, so a failed submission leaves nothing behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use blendfarm_core::error::CoreError;
use blendfarm_core::render::{
    format_walltime, validate_frame_request, validate_video_request, FrameRenderRequest,
    RenderLimits, VideoRenderRequest,
};

use crate::client::{SchedulerClient, SchedulerError, SubmitSpec};

/// Job name used for every video assembly job.
pub const VIDEO_JOB_NAME: &str = "blender-video";

/// Errors from [`JobSubmitter`].
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The request was rejected before a command was built.
    #[error(transparent)]
    InvalidRequest(#[from] CoreError),

    /// The scheduler did not accept the job or its reply was unusable.
    #[error("Submission failed: {0}")]
    SubmissionFailed(#[from] SchedulerError),
}

/// Site-specific submission settings.
#[derive(Debug, Clone)]
pub struct SubmitSettings {
    /// Value of `-M`.
    pub cluster: String,
    pub frame_script: PathBuf,
    pub video_script: PathBuf,
    pub limits: RenderLimits,
}

/// Builds and submits frame-render and video-render jobs.
#[derive(Clone)]
pub struct JobSubmitter {
    client: Arc<dyn SchedulerClient>,
    settings: SubmitSettings,
}

impl JobSubmitter {
    pub fn new(client: Arc<dyn SchedulerClient>, settings: SubmitSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &SubmitSettings {
        &self.settings
    }

    /// Validate `req` and build its submission spec.
    pub fn frame_render_spec(&self, req: &FrameRenderRequest) -> Result<SubmitSpec, CoreError> {
        validate_frame_request(req, &self.settings.limits)?;

        let basename = req
            .blend_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(SubmitSpec {
            job_name: format!("blender-{basename}"),
            exports: vec![
                ("BLEND_FILE_PATH".to_string(), path_string(&req.blend_file)),
                ("OUTPUT_DIR".to_string(), path_string(&req.output_dir)),
                ("FRAMES_RANGE".to_string(), req.frames_range.clone()),
            ],
            num_cpus: req.num_cpus,
            walltime: format_walltime(req.num_hours),
            cluster: self.settings.cluster.clone(),
            output_pattern: log_pattern(&req.output_dir, "frame-render"),
            account: req.account.clone(),
            script: self.settings.frame_script.clone(),
        })
    }

    /// Validate `req` and build its submission spec.
    pub fn video_render_spec(&self, req: &VideoRenderRequest) -> Result<SubmitSpec, CoreError> {
        validate_video_request(req, &self.settings.limits)?;

        Ok(SubmitSpec {
            job_name: VIDEO_JOB_NAME.to_string(),
            exports: vec![
                ("FRAMES_PER_SEC".to_string(), req.frames_per_second.to_string()),
                ("FRAMES_DIR".to_string(), path_string(&req.output_dir)),
            ],
            num_cpus: req.num_cpus,
            walltime: format_walltime(req.num_hours),
            cluster: self.settings.cluster.clone(),
            output_pattern: log_pattern(&req.output_dir, "video-render"),
            account: req.account.clone(),
            script: self.settings.video_script.clone(),
        })
    }

    pub async fn submit_frame_render(&self, req: &FrameRenderRequest) -> Result<String, SubmitError> {
        let spec = self.frame_render_spec(req)?;
        self.submit(&spec).await
    }

    pub async fn submit_video_render(&self, req: &VideoRenderRequest) -> Result<String, SubmitError> {
        let spec = self.video_render_spec(req)?;
        self.submit(&spec).await
    }

    async fn submit(&self, spec: &SubmitSpec) -> Result<String, SubmitError> {
        match self.client.submit(spec).await {
            Ok(job_id) => {
                tracing::info!(job_id = %job_id, job_name = %spec.job_name, "Job submitted");
                Ok(job_id)
            }
            Err(e) => {
                tracing::error!(job_name = %spec.job_name, error = %e, "Job submission failed");
                Err(SubmitError::SubmissionFailed(e))
            }
        }
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn log_pattern(dir: &Path, prefix: &str) -> String {
    path_string(&dir.join(format!("{prefix}-%j.out")))
}
