//! The aggregate movie index and its single point of mutation.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use moviehub_core::error::{MovieHubError, Result};
use moviehub_core::{MovieIndex, MovieRecord};

use crate::site::write_atomic;

/// Merge `record` into `index`.
///
/// An entry for the same movie (catalog identifier, else case-insensitive
/// title) is replaced in place; otherwise the record is appended. The flag
/// reports whether anything differs from the input index, so merging the
/// same record twice reports `false` the second time.
pub fn merge(mut index: MovieIndex, record: MovieRecord) -> (MovieIndex, bool) {
    let changed = index.upsert(record);
    (index, changed)
}

/// Owns the persisted index file.
///
/// `load` and `persist` are only reachable through an [`IndexSession`], and
/// at most one session exists at a time, so a load-merge-persist sequence
/// can never interleave with another and lose its update.
pub struct IndexRepository {
    path: PathBuf,
    gate: Mutex<()>,
}

impl IndexRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            gate: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Enter the index critical section. Waits for any session in progress.
    pub async fn lock(&self) -> IndexSession<'_> {
        let guard = self.gate.lock().await;
        debug!(path = %self.path.display(), "Index session opened");
        IndexSession {
            repo: self,
            _guard: guard,
        }
    }

    /// Read-only view of the last persisted index.
    ///
    /// Persisting replaces the file atomically, so this never sees a partial
    /// write and does not need the session.
    pub async fn snapshot(&self) -> Result<MovieIndex> {
        read_index(&self.path).await
    }
}

/// Exclusive access to the index for one load-merge-persist sequence.
pub struct IndexSession<'a> {
    repo: &'a IndexRepository,
    _guard: MutexGuard<'a, ()>,
}

impl IndexSession<'_> {
    /// Current index; empty when nothing has been persisted yet.
    pub async fn load(&self) -> Result<MovieIndex> {
        read_index(&self.repo.path).await
    }

    /// Overwrite the persisted index with `index` as a whole.
    pub async fn persist(&self, index: &MovieIndex) -> Result<()> {
        let json = serde_json::to_string_pretty(index)?;
        write_atomic(&self.repo.path, &json).await?;
        debug!(path = %self.repo.path.display(), records = index.len(), "Index persisted");
        Ok(())
    }
}

async fn read_index(path: &Path) -> Result<MovieIndex> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(MovieIndex::new()),
        Err(e) => return Err(e.into()),
    };
    if content.trim().is_empty() {
        return Ok(MovieIndex::new());
    }
    serde_json::from_str(&content).map_err(|e| {
        MovieHubError::Serialization(format!("{} is not a valid index: {}", path.display(), e))
    })
}
