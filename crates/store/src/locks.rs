//! Per-slug mutual exclusion.
//!
//! Every read-modify-write of a project directory holds the lock for its
//! slug, so concurrent submissions, renames, and deletes of the same project
//! are serialized instead of silently losing updates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Lazily populated map of slug to async mutex.
#[derive(Default)]
pub struct SlugLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SlugLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, slug: &str) -> Arc<AsyncMutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(map.entry(slug.to_string()).or_default())
    }

    /// Wait for exclusive access to `slug`.
    pub async fn acquire(&self, slug: &str) -> OwnedMutexGuard<()> {
        self.handle(slug).lock_owned().await
    }

    /// Lock two slugs at once. Locks are taken in sorted order so two
    /// opposite renames cannot deadlock; equal slugs are locked once.
    pub async fn acquire_pair(&self, a: &str, b: &str) -> Vec<OwnedMutexGuard<()>> {
        let mut slugs = [a, b];
        slugs.sort_unstable();

        let mut guards = Vec::with_capacity(2);
        guards.push(self.acquire(slugs[0]).await);
        if slugs[0] != slugs[1] {
            guards.push(self.acquire(slugs[1]).await);
        }
        guards
    }

    /// Drop the entry for `slug` if nobody holds or waits on it.
    ///
    /// Call after releasing your own guard. Holders and waiters each keep a
    /// clone of the mutex, so the entry stays while any of them exist.
    pub fn forget(&self, slug: &str) {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if map.get(slug).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            map.remove(slug);
        }
    }
}
