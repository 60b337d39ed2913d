//! In-memory remote store with fault injection, for tests and dry runs.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use moviehub_core::RemoteRevision;

use crate::error::RemoteError;
use crate::store::{RemoteBlob, RemoteStore};

/// One call observed by an [`InMemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Read(String),
    Create(String),
    Update(String),
}

#[derive(Debug, Clone)]
struct StoredBlob {
    content: String,
    revision: RemoteRevision,
}

/// Versioned blob store held in memory.
///
/// Behaves like the GitHub contents API: creates on a taken path fail with
/// `AlreadyExists`, updates naming a stale revision fail with
/// `RevisionConflict`. Faults can be queued per path to reproduce races.
#[derive(Default)]
pub struct InMemoryStore {
    blobs: Mutex<HashMap<String, StoredBlob>>,
    stale_reads: Mutex<HashSet<String>>,
    write_faults: Mutex<HashMap<String, VecDeque<RemoteError>>>,
    ops: Mutex<Vec<StoreOp>>,
    next_revision: AtomicU64,
    delay: Option<Duration>,
    unavailable: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep before answering every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every call with `Unavailable`.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Put a blob in place without recording an operation.
    pub fn seed(&self, path: &str, content: &str) -> RemoteRevision {
        let revision = self.fresh_revision();
        lock(&self.blobs).insert(
            path.to_string(),
            StoredBlob {
                content: content.to_string(),
                revision: revision.clone(),
            },
        );
        revision
    }

    /// Make the next read of `path` report no blob even if one exists, as if
    /// another writer created it right after the read.
    pub fn stale_read_once(&self, path: &str) {
        lock(&self.stale_reads).insert(path.to_string());
    }

    /// Fail the next create or update of `path` with `error`. Faults queue
    /// up, one consumed per write.
    pub fn fail_next_write(&self, path: &str, error: RemoteError) {
        lock(&self.write_faults)
            .entry(path.to_string())
            .or_default()
            .push_back(error);
    }

    pub fn content(&self, path: &str) -> Option<String> {
        lock(&self.blobs).get(path).map(|b| b.content.clone())
    }

    pub fn revision(&self, path: &str) -> Option<RemoteRevision> {
        lock(&self.blobs).get(path).map(|b| b.revision.clone())
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        lock(&self.blobs).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls observed so far, in order.
    pub fn ops(&self) -> Vec<StoreOp> {
        lock(&self.ops).clone()
    }

    /// Number of create and update calls observed for `path`.
    pub fn writes_to(&self, path: &str) -> usize {
        lock(&self.ops)
            .iter()
            .filter(|op| matches!(op, StoreOp::Create(p) | StoreOp::Update(p) if p == path))
            .count()
    }

    fn fresh_revision(&self) -> RemoteRevision {
        let n = self.next_revision.fetch_add(1, Ordering::SeqCst) + 1;
        RemoteRevision::new(format!("r{}", n))
    }

    async fn enter(&self, op: StoreOp) -> Result<(), RemoteError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let path = match &op {
            StoreOp::Read(p) | StoreOp::Create(p) | StoreOp::Update(p) => p.clone(),
        };
        lock(&self.ops).push(op);
        if self.unavailable {
            return Err(RemoteError::Unavailable(format!("{}: store offline", path)));
        }
        Ok(())
    }

    fn take_write_fault(&self, path: &str) -> Option<RemoteError> {
        lock(&self.write_faults)
            .get_mut(path)
            .and_then(VecDeque::pop_front)
    }
}

/// Poisoning only happens if a test panicked mid-operation; keep going with
/// whatever state is there.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    async fn read(&self, path: &str) -> Result<Option<RemoteBlob>, RemoteError> {
        self.enter(StoreOp::Read(path.to_string())).await?;
        if lock(&self.stale_reads).remove(path) {
            return Ok(None);
        }
        Ok(lock(&self.blobs).get(path).map(|b| RemoteBlob {
            content: b.content.clone(),
            revision: b.revision.clone(),
        }))
    }

    async fn create(
        &self,
        path: &str,
        content: &str,
        _message: &str,
    ) -> Result<RemoteRevision, RemoteError> {
        self.enter(StoreOp::Create(path.to_string())).await?;
        if let Some(err) = self.take_write_fault(path) {
            return Err(err);
        }

        let mut blobs = lock(&self.blobs);
        if blobs.contains_key(path) {
            return Err(RemoteError::AlreadyExists(path.to_string()));
        }
        let revision = self.fresh_revision();
        blobs.insert(
            path.to_string(),
            StoredBlob {
                content: content.to_string(),
                revision: revision.clone(),
            },
        );
        Ok(revision)
    }

    async fn update(
        &self,
        path: &str,
        content: &str,
        revision: &RemoteRevision,
        _message: &str,
    ) -> Result<RemoteRevision, RemoteError> {
        self.enter(StoreOp::Update(path.to_string())).await?;
        if let Some(err) = self.take_write_fault(path) {
            return Err(err);
        }

        let mut blobs = lock(&self.blobs);
        let current = blobs
            .get(path)
            .ok_or_else(|| RemoteError::NotFound(path.to_string()))?;
        if &current.revision != revision {
            return Err(RemoteError::RevisionConflict(path.to_string()));
        }
        let next = self.fresh_revision();
        blobs.insert(
            path.to_string(),
            StoredBlob {
                content: content.to_string(),
                revision: next.clone(),
            },
        );
        Ok(next)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_read() {
        let store = InMemoryStore::new();
        let rev = store.create("a.html", "one", "Add a").await.unwrap();
        let blob = store.read("a.html").await.unwrap().unwrap();
        assert_eq!(blob.content, "one");
        assert_eq!(blob.revision, rev);
    }

    #[tokio::test]
    async fn test_create_on_taken_path_fails() {
        let store = InMemoryStore::new();
        store.seed("a.html", "one");
        let err = store.create("a.html", "two", "Add a").await.unwrap_err();
        assert_eq!(err, RemoteError::AlreadyExists("a.html".into()));
        assert_eq!(store.content("a.html").as_deref(), Some("one"));
    }

    #[tokio::test]
    async fn test_update_with_stale_revision_fails() {
        let store = InMemoryStore::new();
        let old = store.seed("a.html", "one");
        store.update("a.html", "two", &old, "Update a").await.unwrap();

        let err = store.update("a.html", "three", &old, "Update a").await.unwrap_err();
        assert_eq!(err, RemoteError::RevisionConflict("a.html".into()));
        assert_eq!(store.content("a.html").as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_update_missing_blob() {
        let store = InMemoryStore::new();
        let err = store
            .update("a.html", "x", &RemoteRevision::new("r9"), "Update a")
            .await
            .unwrap_err();
        assert_eq!(err, RemoteError::NotFound("a.html".into()));
    }

    #[tokio::test]
    async fn test_stale_read_fires_once() {
        let store = InMemoryStore::new();
        store.seed("a.html", "one");
        store.stale_read_once("a.html");
        assert!(store.read("a.html").await.unwrap().is_none());
        assert!(store.read("a.html").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unavailable_records_op() {
        let store = InMemoryStore::new().unavailable();
        let err = store.read("a.html").await.unwrap_err();
        assert!(matches!(err, RemoteError::Unavailable(_)));
        assert_eq!(store.ops(), vec![StoreOp::Read("a.html".into())]);
    }
}
