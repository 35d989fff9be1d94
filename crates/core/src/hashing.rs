//! Shared SHA-256 hex digest utility.
//!
//! Used by the upload deduplicator to compare payloads by content.

use sha2::{Digest, Sha256};

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Incremental SHA-256 hasher for data that arrives in chunks.
#[derive(Default)]
pub struct StreamHasher {
    inner: Sha256,
}

impl StreamHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
    }

    /// Consume the hasher and return the lowercase hex digest.
    pub fn finish_hex(self) -> String {
        let hash = self.inner.finalize();
        format!("{hash:x}")
    }
}
