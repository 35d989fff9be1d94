//! HTTP access to the render API for the polling client.
//!
//! [`ProjectApi`] is the seam the poller depends on; [`HttpProjectApi`]
//! implements it with [`reqwest`].

use async_trait::async_trait;
use blendfarm_core::job_state::DomainState;
use serde::Deserialize;

/// Errors from the polling transport.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// The HTTP request itself failed (network, DNS, decoding, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The configured base URL cannot carry path segments.
    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// What the poller needs to know about a project before it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    pub slug: String,
    pub name: String,
    /// Empty when no frame render was submitted.
    pub frame_render_job_id: String,
    /// Empty when no video render was submitted.
    pub video_render_job_id: String,
}

/// The three reads a poll tick performs.
#[async_trait]
pub trait ProjectApi: Send + Sync {
    /// `GET /api/job_state/{job_id}`
    async fn job_state(&self, job_id: &str) -> Result<DomainState, PollError>;

    /// Names of the files in the project's output directory.
    async fn list_files(&self, slug: &str) -> Result<Vec<String>, PollError>;

    /// `GET /api/projects/{slug}`
    async fn project(&self, slug: &str) -> Result<ProjectInfo, PollError>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct JobStateBody {
    job_state: DomainState,
}

#[derive(Debug, Deserialize)]
struct FileListingBody {
    files: Vec<FileEntryBody>,
}

#[derive(Debug, Deserialize)]
struct FileEntryBody {
    name: String,
}

#[derive(Debug, Deserialize)]
struct DataBody<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ProjectBody {
    slug: String,
    name: String,
    frame_render: JobSlotBody,
    video_render: JobSlotBody,
}

#[derive(Debug, Deserialize)]
struct JobSlotBody {
    #[serde(default)]
    job_id: String,
}

// ---------------------------------------------------------------------------
// reqwest implementation
// ---------------------------------------------------------------------------

/// HTTP client for one render API server.
#[derive(Clone)]
pub struct HttpProjectApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProjectApi {
    /// * `base_url` - server root, e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// `base_url` followed by `segments`, each percent-encoded as a single
    /// path segment (a slug may contain `#`, `?` or `%`).
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, PollError> {
        let invalid = |reason: String| PollError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason,
        };
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> Result<T, PollError> {
        let response = self
            .client
            .get(self.endpoint(segments)?)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(PollError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ProjectApi for HttpProjectApi {
    async fn job_state(&self, job_id: &str) -> Result<DomainState, PollError> {
        let body: JobStateBody = self.get_json(&["api", "job_state", job_id]).await?;
        Ok(body.job_state)
    }

    async fn list_files(&self, slug: &str) -> Result<Vec<String>, PollError> {
        let body: FileListingBody = self
            .get_json(&["api", "projects", slug, "files"])
            .await?;
        Ok(body.files.into_iter().map(|f| f.name).collect())
    }

    async fn project(&self, slug: &str) -> Result<ProjectInfo, PollError> {
        let body: DataBody<ProjectBody> = self.get_json(&["api", "projects", slug]).await?;
        let project = body.data;
        Ok(ProjectInfo {
            slug: project.slug,
            name: project.name,
            frame_render_job_id: project.frame_render.job_id,
            video_render_job_id: project.video_render.job_id,
        })
    }
}
