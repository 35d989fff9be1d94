//! Handlers for the `/projects` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use blendfarm_core::error::CoreError;
use blendfarm_core::job_state::{Badge, DomainState};
use blendfarm_core::project::{JobKind, ProjectConfig};
use blendfarm_store::ProjectSummary;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameProjectRequest {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// One row of the project list.
#[derive(Debug, Serialize)]
pub struct ProjectListItem {
    pub slug: String,
    pub name: String,
    pub icon: Option<String>,
}

impl ProjectListItem {
    fn new(slug: String, config: ProjectConfig) -> Self {
        Self {
            slug,
            name: config.name,
            icon: config.icon,
        }
    }
}

impl From<ProjectSummary> for ProjectListItem {
    fn from(summary: ProjectSummary) -> Self {
        Self::new(summary.slug, summary.config)
    }
}

/// A job slot of a project with its live state.
#[derive(Debug, Serialize)]
pub struct JobView {
    /// Empty until a job has been submitted.
    pub job_id: String,
    pub state: DomainState,
    pub badge: Badge,
}

/// Everything the project page shows.
#[derive(Debug, Serialize)]
pub struct ProjectView {
    pub slug: String,
    pub name: String,
    pub icon: Option<String>,
    pub frame_render: JobView,
    pub video_render: JobView,
    /// Rendered `.png` frames, sorted by name.
    pub images: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ReconcileReport {
    pub removed: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FileEntry {
    pub name: String,
}

/// Body of `GET /api/projects/{slug}/files`. Not wrapped in the data envelope.
#[derive(Debug, Serialize)]
pub struct FileListing {
    pub files: Vec<FileEntry>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/projects
///
/// Orphaned directories are removed first when `RECONCILE_ON_LIST` is set.
pub async fn list(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ProjectListItem>>>> {
    if state.config.reconcile_on_list {
        state.store.reconcile_orphans().await?;
    }
    let projects = state
        .store
        .list_summaries()
        .await?
        .into_iter()
        .map(ProjectListItem::from)
        .collect();
    Ok(Json(DataResponse { data: projects }))
}

/// POST /api/projects
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectListItem>>)> {
    let name = require_name(&input.name)?;
    let slug = state.store.create_project(name, input.icon).await?;
    let config = state.store.read_config(&slug).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ProjectListItem::new(slug, config),
        }),
    ))
}

/// POST /api/projects/reconcile
pub async fn reconcile(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<ReconcileReport>>> {
    let removed = state.store.reconcile_orphans().await?;
    Ok(Json(DataResponse {
        data: ReconcileReport { removed },
    }))
}

/// GET /api/projects/{slug}
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<DataResponse<ProjectView>>> {
    let config = state.store.read_config(&slug).await?;
    let images = state.store.list_images(&slug).await?;

    let frame_id = config.job_id(JobKind::FrameRender).to_string();
    let video_id = config.job_id(JobKind::VideoRender).to_string();
    let (frame_status, video_status) = tokio::join!(
        state.resolver.resolve(&frame_id),
        state.resolver.resolve(&video_id),
    );

    let view = ProjectView {
        slug,
        name: config.name,
        icon: config.icon,
        frame_render: JobView {
            job_id: frame_id,
            state: frame_status.state,
            badge: frame_status.badge,
        },
        video_render: JobView {
            job_id: video_id,
            state: video_status.state,
            badge: video_status.badge,
        },
        images,
    };
    Ok(Json(DataResponse { data: view }))
}

/// PUT /api/projects/{slug}
pub async fn rename(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(input): Json<RenameProjectRequest>,
) -> AppResult<Json<DataResponse<ProjectListItem>>> {
    let name = require_name(&input.name)?;
    let new_slug = state.store.rename_project(&slug, name, input.icon).await?;
    let config = state.store.read_config(&new_slug).await?;
    Ok(Json(DataResponse {
        data: ProjectListItem::new(new_slug, config),
    }))
}

/// DELETE /api/projects/{slug}
pub async fn delete(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<StatusCode> {
    state.store.delete_project(&slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/projects/{slug}/files
pub async fn list_files(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<FileListing>> {
    let files = state
        .store
        .list_files(&slug)
        .await?
        .into_iter()
        .map(|name| FileEntry { name })
        .collect();
    Ok(Json(FileListing { files }))
}

fn require_name(name: &str) -> Result<&str, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("Project name must not be empty".into()));
    }
    Ok(name)
}
