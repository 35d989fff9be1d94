//! Directory-per-project persistence.
//!
//! Layout under the root:
//!
//! ```text
//! <root>/input_files/            shared upload staging (never a project)
//! <root>/<slug>/config.json      project config document
//! <root>/<slug>/*.png            rendered frames
//! ```
//!
//! A directory without `config.json` is an orphan. [`ProjectStore::list_projects`]
//! skips orphans without touching them; [`ProjectStore::reconcile_orphans`]
//! deletes them.

use std::path::{Path, PathBuf};

use blendfarm_core::error::CoreError;
use blendfarm_core::naming::{slugify, validate_slug, INPUT_FILES_DIR};
use blendfarm_core::project::{normalize_icon, ProjectConfig, CONFIG_FILE_NAME};
use blendfarm_core::render::BLEND_EXTENSION;
use tokio::fs;

use crate::locks::SlugLocks;
use crate::{StoreError, StoreResult};

/// A listed project: its slug plus the parsed config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub slug: String,
    pub config: ProjectConfig,
}

/// Owns the project root and serializes writers per slug.
pub struct ProjectStore {
    root: PathBuf,
    locks: SlugLocks,
}

impl ProjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: SlugLocks::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn input_files_dir(&self) -> PathBuf {
        self.root.join(INPUT_FILES_DIR)
    }

    /// Absolute-or-relative path of a project directory. Validates the slug.
    pub fn project_dir(&self, slug: &str) -> StoreResult<PathBuf> {
        validate_slug(slug)?;
        Ok(self.root.join(slug))
    }

    fn config_path(&self, slug: &str) -> StoreResult<PathBuf> {
        Ok(self.project_dir(slug)?.join(CONFIG_FILE_NAME))
    }

    /// Create the root and the upload staging directory if missing.
    pub async fn ensure_layout(&self) -> StoreResult<()> {
        let staging = self.input_files_dir();
        fs::create_dir_all(&staging)
            .await
            .map_err(|e| StoreError::io(&staging, e))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Slugs of all projects with a `config.json`, sorted. Read-only.
    pub async fn list_projects(&self) -> StoreResult<Vec<String>> {
        let (mut projects, _orphans) = self.scan().await?;
        projects.sort();
        Ok(projects)
    }

    /// Listed projects with their configs. Projects whose config cannot be
    /// parsed are logged and left out.
    pub async fn list_summaries(&self) -> StoreResult<Vec<ProjectSummary>> {
        let mut summaries = Vec::new();
        for slug in self.list_projects().await? {
            match self.read_config(&slug).await {
                Ok(config) => summaries.push(ProjectSummary { slug, config }),
                Err(e) => {
                    tracing::warn!(slug = %slug, error = %e, "Skipping unreadable project config");
                }
            }
        }
        Ok(summaries)
    }

    pub async fn read_config(&self, slug: &str) -> StoreResult<ProjectConfig> {
        let path = self.config_path(slug)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CoreError::project_not_found(slug).into());
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        serde_json::from_slice(&bytes).map_err(|source| StoreError::MalformedConfig { path, source })
    }

    /// Regular files in the project directory, sorted by name.
    pub async fn list_files(&self, slug: &str) -> StoreResult<Vec<String>> {
        let dir = self.project_dir(slug)?;
        if !is_dir(&dir).await {
            return Err(CoreError::project_not_found(slug).into());
        }
        list_file_names(&dir, |_| true).await
    }

    /// Rendered PNG frames in the project directory, sorted by name.
    pub async fn list_images(&self, slug: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .list_files(slug)
            .await?
            .into_iter()
            .filter(|name| name.ends_with(".png"))
            .collect())
    }

    /// Uploaded `.blend` files in the staging directory, sorted by name.
    pub async fn list_blend_files(&self) -> StoreResult<Vec<String>> {
        let dir = self.input_files_dir();
        if !is_dir(&dir).await {
            return Ok(Vec::new());
        }
        let suffix = format!(".{BLEND_EXTENSION}");
        list_file_names(&dir, |name| name.ends_with(&suffix)).await
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Create a project directory and its initial config.
    ///
    /// Fails with [`CoreError::Conflict`] if the slug is already taken.
    pub async fn create_project(&self, name: &str, icon: Option<String>) -> StoreResult<String> {
        let slug = slugify(name);
        let dir = self.project_dir(&slug)?;

        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StoreError::io(&self.root, e))?;

        let _guard = self.locks.acquire(&slug).await;

        match fs::create_dir(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(CoreError::Conflict(format!("Project '{slug}' already exists")).into());
            }
            Err(e) => return Err(StoreError::io(&dir, e)),
        }

        let config = ProjectConfig::new(name, icon);
        if let Err(e) = write_config_file(&dir, &config).await {
            // Do not leave an orphan behind.
            let _ = fs::remove_dir_all(&dir).await;
            return Err(e);
        }

        tracing::info!(slug = %slug, name = %name, "Project created");
        Ok(slug)
    }

    /// Overwrite the config document of an existing project.
    pub async fn write_config(&self, slug: &str, config: &ProjectConfig) -> StoreResult<()> {
        let dir = self.project_dir(slug)?;
        let _guard = self.locks.acquire(slug).await;
        if !is_dir(&dir).await {
            return Err(CoreError::project_not_found(slug).into());
        }
        write_config_file(&dir, config).await
    }

    /// Read-modify-write the config under the slug lock.
    pub async fn update_config<F>(&self, slug: &str, mutate: F) -> StoreResult<ProjectConfig>
    where
        F: FnOnce(&mut ProjectConfig),
    {
        let dir = self.project_dir(slug)?;
        let _guard = self.locks.acquire(slug).await;
        let mut config = self.read_config(slug).await?;
        mutate(&mut config);
        write_config_file(&dir, &config).await?;
        Ok(config)
    }

    /// Rename a project. Moves the directory when the slug changes and
    /// always rewrites `name`/`icon`. Recorded job ids are kept.
    pub async fn rename_project(
        &self,
        old_slug: &str,
        new_name: &str,
        icon: Option<String>,
    ) -> StoreResult<String> {
        let old_dir = self.project_dir(old_slug)?;
        let new_slug = slugify(new_name);
        let new_dir = self.project_dir(&new_slug)?;

        let _guards = self.locks.acquire_pair(old_slug, &new_slug).await;

        let mut config = self.read_config(old_slug).await?;

        if new_slug != old_slug {
            if fs::symlink_metadata(&new_dir).await.is_ok() {
                return Err(CoreError::Conflict(format!(
                    "Cannot rename '{old_slug}': project '{new_slug}' already exists"
                ))
                .into());
            }
            fs::rename(&old_dir, &new_dir)
                .await
                .map_err(|e| StoreError::io(&old_dir, e))?;
            tracing::info!(from = %old_slug, to = %new_slug, "Project directory moved");
        }

        config.name = new_name.to_string();
        config.icon = normalize_icon(icon);
        write_config_file(&new_dir, &config).await?;

        Ok(new_slug)
    }

    /// Recursively remove a project directory.
    pub async fn delete_project(&self, slug: &str) -> StoreResult<()> {
        let dir = self.project_dir(slug)?;
        let guard = self.locks.acquire(slug).await;

        match fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CoreError::project_not_found(slug).into());
            }
            Err(e) => return Err(StoreError::io(&dir, e)),
        }

        drop(guard);
        self.locks.forget(slug);
        tracing::info!(slug = %slug, "Project deleted");
        Ok(())
    }

    /// Delete every project directory that lacks `config.json`.
    ///
    /// Destructive and irreversible. Returns the removed slugs, sorted.
    pub async fn reconcile_orphans(&self) -> StoreResult<Vec<String>> {
        let (_projects, orphans) = self.scan().await?;
        let mut removed = Vec::new();

        for slug in orphans {
            let dir = self.root.join(&slug);
            let guard = self.locks.acquire(&slug).await;

            // Re-check under the lock: a create may have just finished.
            if is_file(&dir.join(CONFIG_FILE_NAME)).await {
                continue;
            }

            match fs::remove_dir_all(&dir).await {
                Ok(()) => {
                    tracing::warn!(slug = %slug, "Removed orphaned project directory");
                    removed.push(slug.clone());
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io(&dir, e)),
            }

            drop(guard);
            self.locks.forget(&slug);
        }

        removed.sort();
        Ok(removed)
    }

    /// Split the root's subdirectories into (projects, orphans).
    async fn scan(&self) -> StoreResult<(Vec<String>, Vec<String>)> {
        let mut projects = Vec::new();
        let mut orphans = Vec::new();

        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((projects, orphans)),
            Err(e) => return Err(StoreError::io(&self.root, e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.root, e))?
        {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if validate_slug(&name).is_err() {
                continue;
            }
            let is_directory = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if !is_directory {
                continue;
            }

            if is_file(&entry.path().join(CONFIG_FILE_NAME)).await {
                projects.push(name);
            } else {
                orphans.push(name);
            }
        }

        Ok((projects, orphans))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}

/// Write `config.json` via a temp file and rename, so readers never see a
/// half-written document.
async fn write_config_file(dir: &Path, config: &ProjectConfig) -> StoreResult<()> {
    let json = serde_json::to_vec(config).map_err(|e| CoreError::Internal(e.to_string()))?;
    let target = dir.join(CONFIG_FILE_NAME);
    let tmp = dir.join(format!(".{CONFIG_FILE_NAME}.{}.tmp", uuid::Uuid::new_v4()));

    fs::write(&tmp, &json)
        .await
        .map_err(|e| StoreError::io(&tmp, e))?;
    if let Err(e) = fs::rename(&tmp, &target).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(StoreError::io(&target, e));
    }
    Ok(())
}

async fn list_file_names(dir: &Path, keep: impl Fn(&str) -> bool) -> StoreResult<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = fs::read_dir(dir).await.map_err(|e| StoreError::io(dir, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StoreError::io(dir, e))?
    {
        let is_regular = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if !is_regular {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            if !name.starts_with('.') && keep(&name) {
                names.push(name);
            }
        }
    }

    names.sort();
    Ok(names)
}
