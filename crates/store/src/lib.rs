//! Filesystem persistence for render projects.
//!
//! One directory per project under a root, each holding a `config.json`.
//! See [`ProjectStore`] for the operations and [`upload::maybe_copy`] for
//! content-aware upload writes.

pub mod locks;
pub mod project_store;
pub mod upload;

use std::path::{Path, PathBuf};

use blendfarm_core::error::CoreError;

pub use project_store::{ProjectStore, ProjectSummary};

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A domain-level error (not found, validation, conflict).
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config at {path}: {source}")]
    MalformedConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
