//! Read-revision-then-write upsert of a single blob.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use moviehub_core::RemoteRevision;

use crate::error::RemoteError;
use crate::store::RemoteStore;

/// Commit messages for the two ways a blob can be written.
#[derive(Debug, Clone)]
pub struct CommitMessages {
    pub create: String,
    pub update: String,
}

impl CommitMessages {
    pub fn new(create: impl Into<String>, update: impl Into<String>) -> Self {
        Self {
            create: create.into(),
            update: update.into(),
        }
    }
}

/// What an upsert did to the remote blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created(RemoteRevision),
    Updated(RemoteRevision),
    /// The remote blob already held this content; nothing was written.
    Unchanged(RemoteRevision),
}

impl UpsertOutcome {
    pub fn revision(&self) -> &RemoteRevision {
        match self {
            UpsertOutcome::Created(r) | UpsertOutcome::Updated(r) | UpsertOutcome::Unchanged(r) => r,
        }
    }
}

/// Make the blob at `path` hold `content`.
///
/// Reads the current revision, then updates against it or creates the blob
/// if absent. When the write loses a race (blob appeared, vanished, or moved
/// to a newer revision in between) the read and write are repeated exactly
/// once. Every store call is bounded by `timeout`.
pub async fn upsert_blob(
    store: &dyn RemoteStore,
    path: &str,
    content: &str,
    messages: &CommitMessages,
    timeout: Duration,
) -> Result<UpsertOutcome, RemoteError> {
    match attempt(store, path, content, messages, timeout).await {
        Err(err) if err.is_race() => {
            warn!(store = store.name(), path, error = %err, "Remote write raced, retrying once");
            attempt(store, path, content, messages, timeout).await
        }
        other => other,
    }
}

async fn attempt(
    store: &dyn RemoteStore,
    path: &str,
    content: &str,
    messages: &CommitMessages,
    timeout: Duration,
) -> Result<UpsertOutcome, RemoteError> {
    let current = bounded(path, timeout, store.read(path)).await?;
    match current {
        Some(blob) if blob.content == content => {
            debug!(path, revision = %blob.revision, "Remote blob already current");
            Ok(UpsertOutcome::Unchanged(blob.revision))
        }
        Some(blob) => {
            let rev = bounded(
                path,
                timeout,
                store.update(path, content, &blob.revision, &messages.update),
            )
            .await?;
            debug!(path, from = %blob.revision, to = %rev, "Remote blob updated");
            Ok(UpsertOutcome::Updated(rev))
        }
        None => {
            let rev = bounded(path, timeout, store.create(path, content, &messages.create)).await?;
            debug!(path, revision = %rev, "Remote blob created");
            Ok(UpsertOutcome::Created(rev))
        }
    }
}

async fn bounded<T>(
    path: &str,
    timeout: Duration,
    call: impl Future<Output = Result<T, RemoteError>>,
) -> Result<T, RemoteError> {
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| RemoteError::Timeout(path.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryStore, StoreOp};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn messages() -> CommitMessages {
        CommitMessages::new("Add movie Inception", "Update movie Inception")
    }

    #[tokio::test]
    async fn test_creates_missing_blob() {
        let store = InMemoryStore::new();
        let outcome = upsert_blob(&store, "movies/inception.html", "v1", &messages(), TIMEOUT)
            .await
            .unwrap();
        assert!(matches!(outcome, UpsertOutcome::Created(_)));
        assert_eq!(store.content("movies/inception.html").as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_updates_existing_blob_without_duplicating() {
        let store = InMemoryStore::new();
        store.seed("movies/inception.html", "v1");

        let outcome = upsert_blob(&store, "movies/inception.html", "v2", &messages(), TIMEOUT)
            .await
            .unwrap();
        assert!(matches!(outcome, UpsertOutcome::Updated(_)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.content("movies/inception.html").as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_identical_content_is_not_rewritten() {
        let store = InMemoryStore::new();
        let rev = store.seed("movies.json", "[]");

        let outcome = upsert_blob(&store, "movies.json", "[]", &messages(), TIMEOUT)
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Unchanged(rev));
        assert_eq!(store.writes_to("movies.json"), 0);
    }

    #[tokio::test]
    async fn test_create_race_heals_with_update() {
        let store = InMemoryStore::new();
        store.seed("movies/inception.html", "someone else's");
        store.stale_read_once("movies/inception.html");

        let outcome = upsert_blob(&store, "movies/inception.html", "ours", &messages(), TIMEOUT)
            .await
            .unwrap();
        assert!(matches!(outcome, UpsertOutcome::Updated(_)));
        assert_eq!(store.content("movies/inception.html").as_deref(), Some("ours"));
        assert_eq!(
            store.ops(),
            vec![
                StoreOp::Read("movies/inception.html".into()),
                StoreOp::Create("movies/inception.html".into()),
                StoreOp::Read("movies/inception.html".into()),
                StoreOp::Update("movies/inception.html".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_update_race_heals() {
        let store = InMemoryStore::new();
        store.seed("movies.json", "old");
        store.fail_next_write("movies.json", RemoteError::RevisionConflict("movies.json".into()));

        let outcome = upsert_blob(&store, "movies.json", "new", &messages(), TIMEOUT)
            .await
            .unwrap();
        assert!(matches!(outcome, UpsertOutcome::Updated(_)));
        assert_eq!(store.content("movies.json").as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_retries_at_most_once() {
        let store = InMemoryStore::new();
        store.seed("movies.json", "old");
        store.fail_next_write("movies.json", RemoteError::RevisionConflict("movies.json".into()));
        store.fail_next_write("movies.json", RemoteError::RevisionConflict("movies.json".into()));
        store.fail_next_write("movies.json", RemoteError::RevisionConflict("movies.json".into()));

        let err = upsert_blob(&store, "movies.json", "new", &messages(), TIMEOUT)
            .await
            .unwrap_err();
        assert_eq!(err, RemoteError::RevisionConflict("movies.json".into()));
        assert_eq!(store.writes_to("movies.json"), 2);
        assert_eq!(store.content("movies.json").as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_transport_errors_are_not_retried() {
        let store = InMemoryStore::new().unavailable();
        let err = upsert_blob(&store, "movies.json", "x", &messages(), TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Unavailable(_)));
        assert_eq!(store.ops().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out() {
        let store = InMemoryStore::new().with_delay(Duration::from_secs(60));
        let err = upsert_blob(&store, "movies.json", "x", &messages(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err, RemoteError::Timeout("movies.json".into()));
    }
}
