use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for MovieHub.
///
/// Subsystem crates with richer failure modes define their own error types
/// and implement `From<SubsystemError> for MovieHubError` so that `?` works
/// across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MovieHubError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Movie not found: {0}")]
    NotFound(String),

    #[error("Upstream timed out: {0}")]
    UpstreamTimeout(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Template missing: {}", .0.display())]
    TemplateMissing(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MovieHubError {
    /// Machine-readable status code reported to callers of the pipeline.
    pub fn code(&self) -> &'static str {
        match self {
            MovieHubError::InvalidInput(_) => "invalid_input",
            MovieHubError::NotFound(_) => "not_found",
            MovieHubError::UpstreamTimeout(_) => "upstream_timeout",
            MovieHubError::UpstreamUnavailable(_) => "upstream_unavailable",
            MovieHubError::TemplateMissing(_) => "template_missing",
            MovieHubError::Config(_) => "config_error",
            MovieHubError::Storage(_) | MovieHubError::Io(_) => "storage_error",
            MovieHubError::Serialization(_) => "serialization_error",
        }
    }
}

impl From<toml::de::Error> for MovieHubError {
    fn from(err: toml::de::Error) -> Self {
        MovieHubError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for MovieHubError {
    fn from(err: toml::ser::Error) -> Self {
        MovieHubError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for MovieHubError {
    fn from(err: serde_json::Error) -> Self {
        MovieHubError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for MovieHub operations.
pub type Result<T> = std::result::Result<T, MovieHubError>;
