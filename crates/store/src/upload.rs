//! Content-aware upload writes.
//!
//! [`maybe_copy`] compares the SHA-256 of an incoming payload with the file
//! already at the destination and skips the write when they match. A changed
//! payload fully replaces the destination via temp file + rename.

use std::path::Path;

use blendfarm_core::hashing::{sha256_hex, StreamHasher};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{StoreError, StoreResult};

/// Read buffer size used when hashing files on disk.
const HASH_CHUNK_BYTES: usize = 64 * 1024;

/// What [`maybe_copy`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    /// The destination already held identical content; nothing was written.
    Unchanged { digest: String },
    /// The destination was created or replaced.
    Written { digest: String, bytes: u64 },
}

impl CopyOutcome {
    pub fn digest(&self) -> &str {
        match self {
            Self::Unchanged { digest } | Self::Written { digest, .. } => digest,
        }
    }

    pub fn was_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}

/// Copy `source` to `destination` unless the destination already has the
/// same content.
///
/// The source is buffered in memory so the filesystem is only touched when
/// the digests differ. Callers that already hold the payload should use
/// [`maybe_write`].
pub async fn maybe_copy<R>(mut source: R, destination: &Path) -> StoreResult<CopyOutcome>
where
    R: AsyncRead + Unpin,
{
    let mut payload = Vec::new();
    source
        .read_to_end(&mut payload)
        .await
        .map_err(|e| StoreError::io(destination, e))?;
    maybe_write(&payload, destination).await
}

/// [`maybe_copy`] for a payload already in memory; nothing is copied.
pub async fn maybe_write(payload: &[u8], destination: &Path) -> StoreResult<CopyOutcome> {
    let source_digest = sha256_hex(payload);

    if let Some(existing) = file_digest(destination).await? {
        if existing == source_digest {
            tracing::debug!(
                path = %destination.display(),
                digest = %source_digest,
                "Upload identical to existing file, skipping write",
            );
            return Ok(CopyOutcome::Unchanged {
                digest: source_digest,
            });
        }
    }

    let file_name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = destination.with_file_name(format!(".{file_name}.{}.part", uuid::Uuid::new_v4()));

    fs::write(&tmp, payload)
        .await
        .map_err(|e| StoreError::io(&tmp, e))?;
    if let Err(e) = fs::rename(&tmp, destination).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(StoreError::io(destination, e));
    }

    tracing::info!(
        path = %destination.display(),
        bytes = payload.len(),
        digest = %source_digest,
        "Upload written",
    );
    Ok(CopyOutcome::Written {
        digest: source_digest,
        bytes: payload.len() as u64,
    })
}

/// SHA-256 of a file, or `None` if it does not exist or is not a regular file.
pub async fn file_digest(path: &Path) -> StoreResult<Option<String>> {
    let is_file = fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false);
    if !is_file {
        return Ok(None);
    }

    let mut file = fs::File::open(path)
        .await
        .map_err(|e| StoreError::io(path, e))?;
    let mut hasher = StreamHasher::new();
    let mut buf = vec![0u8; HASH_CHUNK_BYTES];
    loop {
        let n = file
            .read(&mut buf)
            .await
            .map_err(|e| StoreError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(Some(hasher.finish_hex()))
}
