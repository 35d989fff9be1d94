//! Handlers for render submission and the shared upload staging directory.
//!
//! A submitted job id is written to the project config only after the
//! scheduler accepted the job, so a failed submission persists nothing.

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use blendfarm_core::error::CoreError;
use blendfarm_core::project::JobKind;
use blendfarm_core::render::{
    sanitize_blend_file_name, validate_frame_request, FrameRenderRequest, VideoRenderRequest,
};
use blendfarm_store::upload::maybe_write;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// JSON body of `POST /api/render/video`.
#[derive(Debug, Deserialize)]
pub struct VideoRenderBody {
    /// Slug of the project whose frames are assembled.
    pub project: String,
    pub frames_per_second: u32,
    pub num_cpus: u32,
    pub num_hours: u32,
    pub account: String,
}

#[derive(Debug, Serialize)]
pub struct SubmittedJob {
    pub project: String,
    pub kind: JobKind,
    pub job_id: String,
}

/// Where the scene file of a frame render comes from.
enum BlendSource {
    /// A new upload: sanitized file name and content.
    Upload { file_name: String, data: Bytes },
    /// A file already in the staging directory.
    Existing(String),
}

/// Fields of the multipart frame-render form.
#[derive(Default)]
struct FrameRenderForm {
    project: Option<String>,
    upload: Option<(String, Bytes)>,
    uploaded_blend_file: Option<String>,
    frames_range: Option<String>,
    num_cpus: Option<String>,
    num_hours: Option<String>,
    account: Option<String>,
}

impl FrameRenderForm {
    async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name == "blend_file" {
                let file_name = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                // Browsers send an empty part when no file was chosen.
                if !file_name.is_empty() || !data.is_empty() {
                    form.upload = Some((file_name, data));
                }
                continue;
            }

            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            let text = text.trim().to_string();
            if text.is_empty() {
                continue;
            }
            match name.as_str() {
                "project" => form.project = Some(text),
                "uploaded_blend_file" => form.uploaded_blend_file = Some(text),
                "frames_range" => form.frames_range = Some(text),
                "num_cpus" => form.num_cpus = Some(text),
                "num_hours" => form.num_hours = Some(text),
                "account" => form.account = Some(text),
                _ => {} // ignore unknown fields
            }
        }

        Ok(form)
    }

    fn blend_source(&mut self) -> AppResult<BlendSource> {
        if let Some((file_name, data)) = self.upload.take() {
            let file_name = sanitize_blend_file_name(&file_name)?;
            return Ok(BlendSource::Upload { file_name, data });
        }
        if let Some(name) = self.uploaded_blend_file.take() {
            return Ok(BlendSource::Existing(sanitize_blend_file_name(&name)?));
        }
        Err(AppError::BadRequest(
            "Either 'blend_file' or 'uploaded_blend_file' is required".into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/input_files
pub async fn list_input_files(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let files = state.store.list_blend_files().await?;
    Ok(Json(DataResponse { data: files }))
}

/// POST /api/render/frames
///
/// Multipart form with `project`, `frames_range`, `num_cpus`, `num_hours`,
/// `account`, and either a `blend_file` upload or the name of an already
/// uploaded file in `uploaded_blend_file`. Uploads are staged under
/// `input_files/` and skipped when identical content is already there.
pub async fn submit_frames(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<SubmittedJob>>)> {
    let mut form = FrameRenderForm::read(multipart).await?;

    let project = required(form.project.take(), "project")?;
    let output_dir = state.store.project_dir(&project)?;
    // Fails with NotFound before anything is staged or submitted.
    state.store.read_config(&project).await?;

    let source = form.blend_source()?;
    let staging = state.store.input_files_dir();
    let blend_file = match &source {
        BlendSource::Upload { file_name, .. } | BlendSource::Existing(file_name) => {
            staging.join(file_name)
        }
    };

    let request = FrameRenderRequest {
        output_dir,
        blend_file,
        frames_range: required(form.frames_range.take(), "frames_range")?,
        num_cpus: parse_number(form.num_cpus.take(), "num_cpus")?,
        num_hours: parse_number(form.num_hours.take(), "num_hours")?,
        account: required(form.account.take(), "account")?,
    };
    validate_frame_request(&request, &state.submitter.settings().limits)?;

    match source {
        BlendSource::Upload { file_name, data } => {
            state.store.ensure_layout().await?;
            let outcome = maybe_write(&data, &request.blend_file).await?;
            tracing::info!(
                file = %file_name,
                written = outcome.was_written(),
                digest = %outcome.digest(),
                "Scene file staged"
            );
        }
        BlendSource::Existing(file_name) => {
            let is_file = tokio::fs::metadata(&request.blend_file)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if !is_file {
                return Err(CoreError::NotFound {
                    entity: "Blend file",
                    id: file_name,
                }
                .into());
            }
        }
    }

    let job_id = state.submitter.submit_frame_render(&request).await?;
    record_job(&state, &project, JobKind::FrameRender, &job_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: SubmittedJob {
                project,
                kind: JobKind::FrameRender,
                job_id,
            },
        }),
    ))
}

/// POST /api/render/video
pub async fn submit_video(
    State(state): State<AppState>,
    Json(input): Json<VideoRenderBody>,
) -> AppResult<(StatusCode, Json<DataResponse<SubmittedJob>>)> {
    let output_dir = state.store.project_dir(&input.project)?;
    state.store.read_config(&input.project).await?;

    let request = VideoRenderRequest {
        output_dir,
        frames_per_second: input.frames_per_second,
        num_cpus: input.num_cpus,
        num_hours: input.num_hours,
        account: input.account,
    };

    let job_id = state.submitter.submit_video_render(&request).await?;
    record_job(&state, &input.project, JobKind::VideoRender, &job_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: SubmittedJob {
                project: input.project,
                kind: JobKind::VideoRender,
                job_id,
            },
        }),
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Persist an accepted job id on the project.
async fn record_job(state: &AppState, slug: &str, kind: JobKind, job_id: &str) -> AppResult<()> {
    let result = state
        .store
        .update_config(slug, |config| config.set_job_id(kind, job_id))
        .await;

    if let Err(e) = result {
        // The scheduler already owns the job; only the link is lost.
        tracing::error!(
            slug = %slug,
            job_id = %job_id,
            kind = kind.label(),
            error = %e,
            "Submitted job could not be recorded on the project"
        );
        return Err(e.into());
    }

    tracing::info!(slug = %slug, job_id = %job_id, kind = kind.label(), "Job recorded");
    Ok(())
}

fn required(value: Option<String>, field: &str) -> AppResult<String> {
    value.ok_or_else(|| AppError::BadRequest(format!("Missing required '{field}' field")))
}

fn parse_number(value: Option<String>, field: &str) -> AppResult<u32> {
    let raw = required(value, field)?;
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("'{field}' must be a positive integer, got '{raw}'")))
}
