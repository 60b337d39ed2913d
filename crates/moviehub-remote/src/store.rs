use async_trait::async_trait;

use moviehub_core::RemoteRevision;

use crate::error::RemoteError;

/// Current content of a remote blob and the revision it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBlob {
    pub content: String,
    pub revision: RemoteRevision,
}

/// A versioned key-value store of text blobs.
///
/// `create` must fail with `AlreadyExists` when the path is taken, and
/// `update` with `RevisionConflict` when `revision` is no longer current.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the blob at `path`, or `None` if there is none.
    async fn read(&self, path: &str) -> Result<Option<RemoteBlob>, RemoteError>;

    /// Store a new blob. Returns the revision it was stored under.
    async fn create(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<RemoteRevision, RemoteError>;

    /// Replace the blob currently at `revision`.
    async fn update(
        &self,
        path: &str,
        content: &str,
        revision: &RemoteRevision,
        message: &str,
    ) -> Result<RemoteRevision, RemoteError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}
