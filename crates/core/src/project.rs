//! Persisted project configuration (`config.json`).

use serde::{Deserialize, Serialize};

/// File name of the per-project configuration document.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// The serialized state of one project directory.
///
/// Optional fields are omitted from the JSON document when unset, so a fresh
/// project serializes to `{"name": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_render_job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_render_job_id: Option<String>,
}

impl ProjectConfig {
    /// Build a fresh config. Blank icons are dropped.
    pub fn new(name: impl Into<String>, icon: Option<String>) -> Self {
        Self {
            name: name.into(),
            icon: normalize_icon(icon),
            frame_render_job_id: None,
            video_render_job_id: None,
        }
    }

    /// The job id recorded for `kind`, or `""` when none has been submitted.
    pub fn job_id(&self, kind: JobKind) -> &str {
        match kind {
            JobKind::FrameRender => self.frame_render_job_id.as_deref(),
            JobKind::VideoRender => self.video_render_job_id.as_deref(),
        }
        .unwrap_or("")
    }

    pub fn set_job_id(&mut self, kind: JobKind, job_id: impl Into<String>) {
        let slot = match kind {
            JobKind::FrameRender => &mut self.frame_render_job_id,
            JobKind::VideoRender => &mut self.video_render_job_id,
        };
        *slot = Some(job_id.into());
    }
}

/// Treat an empty or whitespace-only icon as absent.
pub fn normalize_icon(icon: Option<String>) -> Option<String> {
    icon.filter(|i| !i.trim().is_empty())
}

/// The two kinds of compute job a project can own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    FrameRender,
    VideoRender,
}

impl JobKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::FrameRender => "frame render",
            Self::VideoRender => "video render",
        }
    }
}
