//! Render job requests, limits, and validation.
//!
//! Requests are validated here before any scheduler command is built, so a
//! rejected request never reaches the scheduler.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default upper bound on requested walltime, in hours.
pub const DEFAULT_MAX_WALLTIME_HOURS: u32 = 48;

/// Default upper bound on requested CPU count.
pub const DEFAULT_MAX_CPUS: u32 = 48;

/// Required extension of uploaded scene files.
pub const BLEND_EXTENSION: &str = "blend";

static FRAMES_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(?:(?:-|\.\.)(\d+))?$").expect("valid regex"));

static ACCOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Parameters for rendering a range of frames from a `.blend` file.
#[derive(Debug, Clone)]
pub struct FrameRenderRequest {
    /// Project directory; frames and the scheduler log are written here.
    pub output_dir: PathBuf,
    pub blend_file: PathBuf,
    pub frames_range: String,
    pub num_cpus: u32,
    pub num_hours: u32,
    pub account: String,
}

/// Parameters for assembling rendered frames into a video.
#[derive(Debug, Clone)]
pub struct VideoRenderRequest {
    /// Project directory holding the frames; the video lands here too.
    pub output_dir: PathBuf,
    pub frames_per_second: u32,
    pub num_cpus: u32,
    pub num_hours: u32,
    pub account: String,
}

/// Resource ceilings enforced before submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderLimits {
    pub max_cpus: u32,
    pub max_hours: u32,
}

impl Default for RenderLimits {
    fn default() -> Self {
        Self {
            max_cpus: DEFAULT_MAX_CPUS,
            max_hours: DEFAULT_MAX_WALLTIME_HOURS,
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Render an hour count as a scheduler walltime, `HH:00:00`.
///
/// ```
/// use blendfarm_core::render::format_walltime;
///
/// assert_eq!(format_walltime(2), "02:00:00");
/// assert_eq!(format_walltime(12), "12:00:00");
/// ```
pub fn format_walltime(hours: u32) -> String {
    format!("{hours:02}:00:00")
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_frame_request(
    req: &FrameRenderRequest,
    limits: &RenderLimits,
) -> Result<(), CoreError> {
    validate_resources(req.num_cpus, req.num_hours, limits)?;
    validate_frames_range(&req.frames_range)?;
    validate_account(&req.account)?;
    validate_export_path("blend file", &req.blend_file)?;
    validate_export_path("output directory", &req.output_dir)?;
    Ok(())
}

pub fn validate_video_request(
    req: &VideoRenderRequest,
    limits: &RenderLimits,
) -> Result<(), CoreError> {
    validate_resources(req.num_cpus, req.num_hours, limits)?;
    if req.frames_per_second == 0 {
        return Err(CoreError::Validation(
            "frames_per_second must be at least 1".to_string(),
        ));
    }
    validate_account(&req.account)?;
    validate_export_path("output directory", &req.output_dir)?;
    Ok(())
}

/// CPU count and walltime must both be within `1..=limit`.
pub fn validate_resources(
    num_cpus: u32,
    num_hours: u32,
    limits: &RenderLimits,
) -> Result<(), CoreError> {
    if num_cpus == 0 || num_cpus > limits.max_cpus {
        return Err(CoreError::Validation(format!(
            "num_cpus must be between 1 and {}, got {num_cpus}",
            limits.max_cpus
        )));
    }
    if num_hours == 0 || num_hours > limits.max_hours {
        return Err(CoreError::Validation(format!(
            "num_hours must be between 1 and {}, got {num_hours}",
            limits.max_hours
        )));
    }
    Ok(())
}

/// Accepts a single frame (`7`) or an inclusive range (`1-250`, `1..250`).
pub fn validate_frames_range(range: &str) -> Result<(), CoreError> {
    let caps = FRAMES_RANGE_RE.captures(range).ok_or_else(|| {
        CoreError::Validation(format!(
            "Invalid frames range '{range}'. Expected N, N-M, or N..M"
        ))
    })?;

    if let Some(end) = caps.get(2) {
        let start: u64 = caps[1]
            .parse()
            .map_err(|_| CoreError::Validation(format!("Frame number too large in '{range}'")))?;
        let end: u64 = end
            .as_str()
            .parse()
            .map_err(|_| CoreError::Validation(format!("Frame number too large in '{range}'")))?;
        if start > end {
            return Err(CoreError::Validation(format!(
                "Frames range '{range}' starts after it ends"
            )));
        }
    }
    Ok(())
}

pub fn validate_account(account: &str) -> Result<(), CoreError> {
    if ACCOUNT_RE.is_match(account) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid account id '{account}'"
        )))
    }
}

/// Values travel inside `--export K=V,...`, so `,` and `=` would corrupt the
/// list.
pub fn validate_export_path(what: &str, path: &Path) -> Result<(), CoreError> {
    let text = path.to_string_lossy();
    if text.contains(',') || text.contains('=') {
        return Err(CoreError::Validation(format!(
            "The {what} path must not contain ',' or '=': {text}"
        )));
    }
    Ok(())
}

/// Reduce an uploaded file name to its base name and require `.blend`.
pub fn sanitize_blend_file_name(file_name: &str) -> Result<String, CoreError> {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.starts_with('.'))
        .ok_or_else(|| CoreError::Validation(format!("Invalid file name '{file_name}'")))?;

    let has_ext = Path::new(base)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(BLEND_EXTENSION));
    if !has_ext {
        return Err(CoreError::Validation(format!(
            "Unsupported file '{base}'. Expected a .{BLEND_EXTENSION} file"
        )));
    }
    if base.contains(',') || base.contains('=') {
        return Err(CoreError::Validation(format!(
            "File name '{base}' must not contain ',' or '='"
        )));
    }
    Ok(base.to_string())
}
