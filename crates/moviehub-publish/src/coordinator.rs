//! Publish orchestration.
//!
//! Steps before the page write (validation, lookup, identifier derivation,
//! template loading) abort without side effects. Once the local page and
//! index are committed the publish has succeeded; the homepage refresh and
//! remote replication can only add warnings.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use moviehub_catalog::MetadataResolver;
use moviehub_core::config::{MovieHubConfig, RemoteMode};
use moviehub_core::error::{MovieHubError, Result};
use moviehub_core::{
    page_identifier, MovieIndex, MovieMetadata, MovieRecord, PublishResult, PublishStatus,
    RemoteStatus,
};
use moviehub_remote::{CommitMessages, RemoteStore};
use moviehub_render::{PageRenderer, Templates};

use crate::index::{merge, IndexRepository};
use crate::mirror::{Artifact, Mirror};
use crate::site::{write_atomic, SiteLayout};

enum Replication {
    Disabled,
    Sync(Arc<Mirror>),
    Deferred(Arc<Mirror>),
}

/// Runs publish requests against one site.
///
/// Safe to share across tasks; concurrent publishes only serialize on the
/// index critical section.
pub struct PublishCoordinator {
    resolver: Arc<dyn MetadataResolver>,
    renderer: PageRenderer,
    layout: SiteLayout,
    index: IndexRepository,
    lookup_timeout: Duration,
    replication: Replication,
}

impl PublishCoordinator {
    /// Coordinator with remote replication disabled.
    pub fn new(
        resolver: Arc<dyn MetadataResolver>,
        renderer: PageRenderer,
        layout: SiteLayout,
        lookup_timeout: Duration,
    ) -> Self {
        let index = IndexRepository::new(layout.local(layout.index_path()));
        Self {
            resolver,
            renderer,
            layout,
            index,
            lookup_timeout,
            replication: Replication::Disabled,
        }
    }

    /// Replicate through `mirror`, inline or in the background per `mode`.
    pub fn with_mirror(mut self, mirror: Arc<Mirror>, mode: RemoteMode) -> Self {
        self.replication = match mode {
            RemoteMode::Sync => Replication::Sync(mirror),
            RemoteMode::Deferred => Replication::Deferred(mirror),
            RemoteMode::Disabled => Replication::Disabled,
        };
        self
    }

    /// Wire a coordinator from configuration. `store` is ignored when remote
    /// mode is disabled.
    pub fn from_config(
        config: &MovieHubConfig,
        root: impl Into<PathBuf>,
        resolver: Arc<dyn MetadataResolver>,
        store: Option<Arc<dyn RemoteStore>>,
    ) -> Self {
        let layout = SiteLayout::new(root, config.site.clone());
        let coordinator = Self::new(
            resolver,
            PageRenderer::from_config(&config.site),
            layout.clone(),
            config.catalog.timeout(),
        );
        match store {
            Some(store) if config.remote.mode != RemoteMode::Disabled => {
                let mirror = Arc::new(Mirror::new(store, layout, config.remote.timeout()));
                coordinator.with_mirror(mirror, config.remote.mode)
            }
            _ => coordinator,
        }
    }

    pub fn layout(&self) -> &SiteLayout {
        &self.layout
    }

    pub fn renderer(&self) -> &PageRenderer {
        &self.renderer
    }

    /// The mirror used for replication, if any.
    pub fn mirror(&self) -> Option<&Arc<Mirror>> {
        match &self.replication {
            Replication::Disabled => None,
            Replication::Sync(m) | Replication::Deferred(m) => Some(m),
        }
    }

    /// The index as last persisted.
    pub async fn index(&self) -> Result<MovieIndex> {
        self.index.snapshot().await
    }

    /// Homepage rendered from the current index.
    pub async fn homepage(&self) -> Result<String> {
        let templates = self.renderer.load().await?;
        Ok(templates.homepage(&self.index.snapshot().await?))
    }

    /// Publish `title`: resolve, render, commit locally, then replicate.
    pub async fn publish(&self, title: &str) -> Result<PublishResult> {
        let query = title.trim();
        if query.is_empty() {
            return Err(MovieHubError::InvalidInput(
                "movie title must not be empty".to_string(),
            ));
        }

        info!(title = query, "Publishing movie");

        let meta = self.resolve(query).await?;
        let page_id = derive_page_id(&meta)?;
        let templates = self.renderer.load().await?;

        let page = self.layout.page_path(&page_id);
        let record = MovieRecord::from_metadata(&meta, page.clone());

        // Local commit: page first, then the index critical section.
        write_atomic(&self.layout.local(&page), &templates.movie_page(&record)).await?;
        debug!(page = %page, "Page written");

        let (index_changed, homepage_warning) = {
            let session = self.index.lock().await;
            let (index, changed) = merge(session.load().await?, record.clone());
            if changed {
                session.persist(&index).await?;
            }
            (changed, self.refresh_homepage(&templates, &index).await)
        };

        if index_changed {
            info!(title = %record.title, page = %page, "Index updated");
        } else {
            info!(title = %record.title, "Movie already published with identical fields");
        }

        let mut warnings: Vec<String> = homepage_warning.into_iter().collect();
        let include_homepage = warnings.is_empty();
        let (remote, remote_warnings) = self
            .replicate(&record.title, &page, include_homepage)
            .await;
        warnings.extend(remote_warnings);

        Ok(PublishResult {
            status: if index_changed {
                PublishStatus::Published
            } else {
                PublishStatus::Unchanged
            },
            id: record.id,
            title: record.title,
            page_id,
            page,
            index_changed,
            remote,
            warnings,
            published_at: Utc::now(),
        })
    }

    async fn resolve(&self, query: &str) -> Result<MovieMetadata> {
        let lookup = tokio::time::timeout(self.lookup_timeout, self.resolver.lookup(query)).await;
        let found = match lookup {
            Ok(result) => result?,
            Err(_) => {
                warn!(title = query, resolver = self.resolver.name(), "Catalog lookup timed out");
                return Err(MovieHubError::UpstreamTimeout(format!(
                    "{} lookup exceeded {:?}",
                    self.resolver.name(),
                    self.lookup_timeout
                )));
            }
        };
        found.ok_or_else(|| {
            info!(title = query, "No catalog match");
            MovieHubError::NotFound(query.to_string())
        })
    }

    /// Re-render the homepage unless the file already matches `index`.
    ///
    /// Runs after the index is committed, so a failure comes back as a
    /// warning and the next publish retries it.
    async fn refresh_homepage(&self, templates: &Templates, index: &MovieIndex) -> Option<String> {
        let path = self.layout.local(self.layout.homepage_path());
        let rendered = templates.homepage(index);
        if let Ok(current) = tokio::fs::read_to_string(&path).await {
            if current == rendered {
                return None;
            }
        }
        match write_atomic(&path, &rendered).await {
            Ok(()) => {
                debug!(path = %path.display(), movies = index.len(), "Homepage rendered");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Homepage not updated");
                Some(format!("homepage {} not updated: {}", self.layout.homepage_path(), e))
            }
        }
    }

    async fn replicate(
        &self,
        title: &str,
        page: &str,
        include_homepage: bool,
    ) -> (RemoteStatus, Vec<String>) {
        let mut artifacts = vec![
            Artifact::new(
                page,
                CommitMessages::new(format!("Add movie {}", title), format!("Update movie {}", title)),
            ),
            Artifact::new(
                self.layout.index_path(),
                CommitMessages::new(
                    format!("Add movie index with {}", title),
                    format!("Update movie index with {}", title),
                ),
            ),
        ];
        // A homepage that failed to render locally would push stale content.
        if include_homepage {
            artifacts.push(Artifact::new(
                self.layout.homepage_path(),
                CommitMessages::new(
                    format!("Add homepage with {}", title),
                    format!("Update homepage with {}", title),
                ),
            ));
        }

        match &self.replication {
            Replication::Disabled => (RemoteStatus::Disabled, Vec::new()),
            Replication::Sync(mirror) => {
                let report = mirror.replicate(&artifacts).await;
                let warnings = report.warnings();
                if report.succeeded() {
                    (RemoteStatus::Succeeded, warnings)
                } else {
                    (RemoteStatus::Failed, warnings)
                }
            }
            Replication::Deferred(mirror) => {
                let job_id = mirror.spawn(title, artifacts);
                debug!(%job_id, title, "Remote mirror deferred");
                (RemoteStatus::Pending { job_id }, Vec::new())
            }
        }
    }
}

/// Page identifier for resolved metadata.
///
/// Titles without a single alphanumeric character fall back to the catalog
/// identifier so the page still gets a stable name.
fn derive_page_id(meta: &MovieMetadata) -> Result<String> {
    let from_title = page_identifier(&meta.title);
    if !from_title.is_empty() {
        return Ok(from_title);
    }
    meta.id
        .as_ref()
        .map(|id| page_identifier(&id.to_string()))
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            MovieHubError::InvalidInput(format!(
                "cannot derive a page name from title '{}'",
                meta.title
            ))
        })
}
