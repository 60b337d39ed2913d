use async_trait::async_trait;

use moviehub_core::error::Result;
use moviehub_core::MovieMetadata;

/// Looks titles up in an external movie catalog.
///
/// `Ok(None)` means the catalog answered and had no match. Transport
/// failures surface as `UpstreamTimeout` or `UpstreamUnavailable`.
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    /// Resolve `title` to the catalog's first matching entry.
    async fn lookup(&self, title: &str) -> Result<Option<MovieMetadata>>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}
