//! Error types for the remote store.

use moviehub_core::error::MovieHubError;

/// Errors from remote store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("blob already exists: {0}")]
    AlreadyExists(String),
    #[error("revision conflict on {0}")]
    RevisionConflict(String),
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("remote store timed out on {0}")]
    Timeout(String),
    #[error("remote store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid blob encoding: {0}")]
    Encoding(String),
}

impl RemoteError {
    /// Whether the failure comes from the blob changing between the read and
    /// the write. Those heal with a fresh read.
    pub fn is_race(&self) -> bool {
        matches!(
            self,
            RemoteError::AlreadyExists(_) | RemoteError::RevisionConflict(_) | RemoteError::NotFound(_)
        )
    }
}

impl From<RemoteError> for MovieHubError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Timeout(_) => MovieHubError::UpstreamTimeout(err.to_string()),
            RemoteError::Encoding(_) => MovieHubError::Serialization(err.to_string()),
            _ => MovieHubError::UpstreamUnavailable(err.to_string()),
        }
    }
}
