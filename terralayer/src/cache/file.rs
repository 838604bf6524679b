//! Disk cache of raw response bytes.
//!
//! # Flow
//!
//! ```text
//! get_or_load(path)
//!     │
//!     ├── pending load for path? ──► share it
//!     │
//!     ▼
//! read file ── hit ──► bytes
//!     │ miss (or unreadable: log, delete)
//!     ▼
//! load() ──► Some: write <file>.tmp, rename over <file>
//!        └─► None: delete <file>
//! ```
//!
//! Entries leave the pending map only after the write has finished, so a
//! later request always observes the file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{FutureExt, Shared};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, trace};

use super::temporary_path;
use crate::loader::{Cacher, LoadFn, LoadFuture};

type PendingLoads = DashMap<PathBuf, Shared<LoadFuture<Bytes>>>;

/// Persists loaded bytes to disk, one file per key.
#[derive(Clone, Default)]
pub struct FileCacher {
    pending: Arc<PendingLoads>,
}

impl FileCacher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of loads currently in progress.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Reads a cached file, treating any failure as a miss.
    pub async fn get(path: &Path) -> Option<Bytes> {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                trace!(path = %path.display(), bytes = bytes.len(), "disk cache hit");
                Some(Bytes::from(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!(path = %path.display(), "disk cache miss");
                None
            }
            Err(e) => {
                error!(
                    path = %path.display(),
                    error = %e,
                    "failed to read cached file, dropping"
                );
                delete_quietly(path).await;
                None
            }
        }
    }

    /// Stores `value` at `path`, or deletes the file when `value` is `None`.
    ///
    /// Failures are logged and leave no file behind.
    pub async fn put(path: &Path, value: Option<&Bytes>) {
        let Some(bytes) = value else {
            delete_quietly(path).await;
            return;
        };

        match write_atomic(path, bytes).await {
            Ok(()) => debug!(path = %path.display(), bytes = bytes.len(), "cached file written"),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                // Another process is writing the same file
                debug!(path = %path.display(), "cache file already being written");
            }
            Err(e) => {
                error!(
                    path = %path.display(),
                    error = %e,
                    "failed to write cached file, dropping"
                );
                delete_quietly(&temporary_path(path)).await;
                delete_quietly(path).await;
            }
        }
    }

    async fn read_or_load(
        path: PathBuf,
        load: LoadFn<Bytes>,
        pending: Arc<PendingLoads>,
    ) -> Option<Bytes> {
        let value = match Self::get(&path).await {
            Some(bytes) => Some(bytes),
            None => {
                let loaded = load().await;
                Self::put(&path, loaded.as_ref()).await;
                loaded
            }
        };
        pending.remove(&path);
        value
    }
}

impl Cacher<PathBuf, Bytes> for FileCacher {
    fn get_or_load(&self, path: PathBuf, load: LoadFn<Bytes>) -> LoadFuture<Bytes> {
        let shared = match self.pending.entry(path) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let fut = Self::read_or_load(entry.key().clone(), load, Arc::clone(&self.pending))
                    .boxed()
                    .shared();
                entry.insert(fut.clone());
                fut
            }
        };
        shared.boxed()
    }
}

impl std::fmt::Debug for FileCacher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCacher")
            .field("pending", &self.pending.len())
            .finish()
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let temporary = temporary_path(path);
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temporary)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&temporary, path).await
}

async fn delete_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            debug!(path = %path.display(), error = %e, "failed to delete cache file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    fn counting_load(calls: &Arc<AtomicUsize>, value: Option<&'static [u8]>) -> LoadFn<Bytes> {
        let calls = Arc::clone(calls);
        Box::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                value.map(Bytes::from_static)
            }
            .boxed()
        })
    }

    #[tokio::test]
    async fn test_miss_loads_and_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("elevation/0/1/2");
        let cacher = FileCacher::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let value = cacher
            .get_or_load(path.clone(), counting_load(&calls, Some(b"tile")))
            .await;

        assert_eq!(value.as_deref(), Some(&b"tile"[..]));
        assert_eq!(std::fs::read(&path).unwrap(), b"tile");
        assert!(!temporary_path(&path).exists());
        assert_eq!(cacher.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_hit_skips_loader() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cached");
        std::fs::write(&path, b"on disk").unwrap();
        let cacher = FileCacher::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let value = cacher
            .get_or_load(path, counting_load(&calls, Some(b"remote")))
            .await;

        assert_eq!(value.as_deref(), Some(&b"on disk"[..]));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_absent_load_deletes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone");
        let cacher = FileCacher::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let value = cacher.get_or_load(path.clone(), counting_load(&calls, None)).await;

        assert!(value.is_none());
        assert!(!path.exists());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_coalesce() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shared/tile");
        let cacher = FileCacher::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let loads: Vec<_> = (0..10)
            .map(|_| cacher.get_or_load(path.clone(), counting_load(&calls, Some(b"once"))))
            .collect();
        let results = futures::future::join_all(loads).await;

        assert!(results.iter().all(|r| r.as_deref() == Some(&b"once"[..])));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cacher.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_entry_is_dropped() {
        let dir = TempDir::new().unwrap();
        // A directory where a file is expected fails to read
        let path = dir.path().join("broken");
        std::fs::create_dir(&path).unwrap();

        let value = FileCacher::get(&path).await;

        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_put_none_removes_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stale");
        std::fs::write(&path, b"old").unwrap();

        FileCacher::put(&path, None).await;

        assert!(!path.exists());
    }
}
