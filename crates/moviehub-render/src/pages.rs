use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use moviehub_core::config::SiteConfig;
use moviehub_core::error::{MovieHubError, Result};
use moviehub_core::{MovieIndex, MovieRecord};

use crate::template::{escape_html, render};

/// Bundled detail page template, installed by `moviehub init`.
pub const DEFAULT_MOVIE_TEMPLATE: &str = include_str!("../assets/movie_template.html");

/// Bundled homepage template, installed by `moviehub init`.
pub const DEFAULT_INDEX_TEMPLATE: &str = include_str!("../assets/index_template.html");

/// The catalog search never reports a director.
pub const UNKNOWN_DIRECTOR: &str = "Unknown";

/// Locates the site templates on disk.
#[derive(Debug, Clone)]
pub struct PageRenderer {
    templates_dir: PathBuf,
    movie_template: String,
    index_template: String,
}

impl PageRenderer {
    pub fn new(
        templates_dir: impl Into<PathBuf>,
        movie_template: impl Into<String>,
        index_template: impl Into<String>,
    ) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            movie_template: movie_template.into(),
            index_template: index_template.into(),
        }
    }

    pub fn from_config(site: &SiteConfig) -> Self {
        Self::new(
            site.templates_path(),
            site.movie_template.clone(),
            site.index_template.clone(),
        )
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    /// Read both templates.
    ///
    /// Called before anything is written so that a missing template aborts
    /// a publish without side effects.
    pub async fn load(&self) -> Result<Templates> {
        Ok(Templates {
            movie: self.read(&self.movie_template).await?,
            index: self.read(&self.index_template).await?,
        })
    }

    async fn read(&self, name: &str) -> Result<String> {
        let path = self.templates_dir.join(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                debug!(path = %path.display(), "Template loaded");
                Ok(content)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(MovieHubError::TemplateMissing(path)),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the bundled templates where none exist yet.
    ///
    /// Returns the paths that were created; existing files are left alone.
    pub async fn install_defaults(&self) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(&self.templates_dir).await?;
        let mut created = Vec::new();
        for (name, content) in [
            (&self.movie_template, DEFAULT_MOVIE_TEMPLATE),
            (&self.index_template, DEFAULT_INDEX_TEMPLATE),
        ] {
            let path = self.templates_dir.join(name);
            if tokio::fs::try_exists(&path).await? {
                continue;
            }
            tokio::fs::write(&path, content).await?;
            info!(path = %path.display(), "Installed default template");
            created.push(path);
        }
        Ok(created)
    }
}

/// Loaded template sources. Rendering from here on is pure.
#[derive(Debug, Clone)]
pub struct Templates {
    movie: String,
    index: String,
}

impl Templates {
    pub fn new(movie: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            movie: movie.into(),
            index: index.into(),
        }
    }

    /// Detail page for one movie.
    pub fn movie_page(&self, record: &MovieRecord) -> String {
        render(&self.movie, &movie_fields(record))
    }

    /// Homepage listing every movie in index order.
    pub fn homepage(&self, index: &MovieIndex) -> String {
        render(&self.index, &homepage_fields(index))
    }
}

/// Escaped page fields for a record. Absent values are empty strings.
pub fn movie_fields(record: &MovieRecord) -> HashMap<String, String> {
    let id = record.id.as_ref().map(|id| id.to_string()).unwrap_or_default();
    [
        ("id", id),
        ("title", record.title.clone()),
        ("year", record.year.clone()),
        ("genre", record.genre.clone()),
        ("description", record.description.clone()),
        ("director", UNKNOWN_DIRECTOR.to_string()),
        ("page", record.page.clone()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), escape_html(&v)))
    .collect()
}

fn homepage_fields(index: &MovieIndex) -> HashMap<String, String> {
    let items: Vec<String> = index
        .iter()
        .map(|r| {
            format!(
                r#"    <li><a href="{}">{}</a> <span class="year">{}</span></li>"#,
                escape_html(&r.page),
                escape_html(&r.title),
                escape_html(&r.year),
            )
        })
        .collect();

    HashMap::from([
        ("movies".to_string(), items.join("\n")),
        ("count".to_string(), index.len().to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use moviehub_core::{CatalogId, MovieMetadata};

    fn inception() -> MovieRecord {
        MovieRecord::from_metadata(
            &MovieMetadata {
                id: Some(CatalogId::Numeric(27205)),
                title: "Inception".into(),
                overview: "A thief...".into(),
                release_date: "2010-07-16".into(),
                genres: vec![],
            },
            "movies/inception.html",
        )
    }

    fn bundled() -> Templates {
        Templates::new(DEFAULT_MOVIE_TEMPLATE, DEFAULT_INDEX_TEMPLATE)
    }

    #[test]
    fn test_movie_page_fields() {
        let html = bundled().movie_page(&inception());
        assert!(html.contains("<h1>Inception</h1>"));
        assert!(html.contains("<dd>2010</dd>"));
        assert!(html.contains("<dd>Unknown</dd>"));
        assert!(html.contains("<dt>Genre</dt><dd></dd>"));
        assert!(html.contains("A thief..."));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_movie_page_escapes_values() {
        let mut rec = inception();
        rec.title = "<script>".into();
        let html = bundled().movie_page(&rec);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_homepage_lists_in_order() {
        let mut second = inception();
        second.id = Some(CatalogId::Numeric(603));
        second.title = "The Matrix".into();
        second.page = "movies/thematrix.html".into();
        let index = MovieIndex::from_records(vec![inception(), second]);

        let html = bundled().homepage(&index);
        let first = html.find("Inception").unwrap();
        let second = html.find("The Matrix").unwrap();
        assert!(first < second);
        assert!(html.contains(r#"href="movies/thematrix.html""#));
        assert!(html.contains("Published movies: 2"));
    }

    #[tokio::test]
    async fn test_missing_template_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = PageRenderer::new(dir.path(), "movie.html", "index.html");
        let err = renderer.load().await.unwrap_err();
        match err {
            MovieHubError::TemplateMissing(path) => {
                assert_eq!(path, dir.path().join("movie.html"));
            }
            other => panic!("expected TemplateMissing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_install_defaults_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = PageRenderer::new(dir.path().join("templates"), "movie.html", "index.html");

        let created = renderer.install_defaults().await.unwrap();
        assert_eq!(created.len(), 2);
        assert!(renderer.install_defaults().await.unwrap().is_empty());

        let templates = renderer.load().await.unwrap();
        assert!(templates.movie_page(&inception()).contains("Inception"));
    }

    #[tokio::test]
    async fn test_install_defaults_keeps_custom_template() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("movie.html"), "custom {{ title }}").unwrap();
        let renderer = PageRenderer::new(dir.path(), "movie.html", "index.html");

        let created = renderer.install_defaults().await.unwrap();
        assert_eq!(created, vec![dir.path().join("index.html")]);

        let templates = renderer.load().await.unwrap();
        assert_eq!(templates.movie_page(&inception()), "custom Inception");
    }
}
