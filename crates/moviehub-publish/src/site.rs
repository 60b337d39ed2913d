use std::path::{Path, PathBuf};

use uuid::Uuid;

use moviehub_core::config::SiteConfig;
use moviehub_core::error::Result;

/// Where site artifacts live, locally and in the remote store.
///
/// Remote paths are the site-relative paths; local paths are those joined
/// onto the site root.
#[derive(Debug, Clone)]
pub struct SiteLayout {
    root: PathBuf,
    site: SiteConfig,
}

impl SiteLayout {
    pub fn new(root: impl Into<PathBuf>, site: SiteConfig) -> Self {
        Self {
            root: root.into(),
            site,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn page_path(&self, page_id: &str) -> String {
        self.site.page_path(page_id)
    }

    pub fn index_path(&self) -> &str {
        &self.site.index_file
    }

    pub fn homepage_path(&self) -> &str {
        &self.site.homepage_file
    }

    /// Local file for a site-relative path.
    pub fn local(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

/// Replace `path` with `content` so readers never observe a partial file.
///
/// Each call stages into its own temp file next to `path`, so concurrent
/// writers of one path never share a staging file; the last rename wins.
pub(crate) async fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = staging_path(path);
    let staged = match tokio::fs::write(&tmp, content).await {
        Ok(()) => tokio::fs::rename(&tmp, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = staged {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(".{}.tmp", Uuid::new_v4().simple()));
    PathBuf::from(tmp)
}
