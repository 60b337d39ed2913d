//! TMDB backend for metadata resolution.
//!
//! Calls `GET {api_base}/search/movie` and normalizes the first hit.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use moviehub_core::config::CatalogConfig;
use moviehub_core::error::{MovieHubError, Result};
use moviehub_core::{CatalogId, MovieMetadata};

use crate::genres::genre_names;
use crate::resolver::MetadataResolver;

/// TMDB search API client.
pub struct TmdbResolver {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    language: Option<String>,
}

impl TmdbResolver {
    /// Create a resolver, reading the API key from the environment variable
    /// named in config.
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            MovieHubError::Config(format!(
                "TMDB lookup requires the {} environment variable to be set",
                config.api_key_env
            ))
        })?;
        Self::with_api_key(config, api_key)
    }

    /// Create a resolver with an explicit API key.
    pub fn with_api_key(config: &CatalogConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| MovieHubError::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(api_base = %config.api_base, "TMDB resolver ready");

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            language: config.language.clone(),
        })
    }
}

/// `/search/movie` response body.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: u64,
    title: String,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    genre_ids: Vec<u64>,
}

impl From<SearchHit> for MovieMetadata {
    fn from(hit: SearchHit) -> Self {
        MovieMetadata {
            id: Some(CatalogId::Numeric(hit.id)),
            title: hit.title,
            overview: hit.overview.unwrap_or_default(),
            release_date: hit.release_date.unwrap_or_default(),
            genres: genre_names(&hit.genre_ids),
        }
    }
}

fn first_hit(body: SearchResponse) -> Option<MovieMetadata> {
    body.results.into_iter().next().map(MovieMetadata::from)
}

/// Classify a reqwest failure for the publish pipeline.
fn transport_error(service: &str, err: reqwest::Error) -> MovieHubError {
    if err.is_timeout() {
        MovieHubError::UpstreamTimeout(format!("{} did not answer in time", service))
    } else {
        MovieHubError::UpstreamUnavailable(format!("{}: {}", service, err))
    }
}

#[async_trait]
impl MetadataResolver for TmdbResolver {
    async fn lookup(&self, title: &str) -> Result<Option<MovieMetadata>> {
        let url = format!("{}/search/movie", self.api_base);
        let mut query = vec![("api_key", self.api_key.as_str()), ("query", title)];
        if let Some(lang) = &self.language {
            query.push(("language", lang.as_str()));
        }

        debug!(title, "Querying TMDB");

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| transport_error("TMDB", e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, title, "TMDB search failed");
            return Err(MovieHubError::UpstreamUnavailable(format!(
                "TMDB returned HTTP {}",
                status
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| MovieHubError::UpstreamUnavailable(format!("TMDB response: {}", e)))?;

        let meta = first_hit(body);
        match &meta {
            Some(m) => debug!(title, resolved = %m.title, "TMDB match"),
            None => debug!(title, "TMDB returned no results"),
        }
        Ok(meta)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_hit_normalizes() {
        let body: SearchResponse = serde_json::from_str(
            r#"{
                "page": 1,
                "results": [
                    {"id": 27205, "title": "Inception", "overview": "A thief...",
                     "release_date": "2010-07-16", "genre_ids": [28, 878, 12]},
                    {"id": 1, "title": "Inception: The Cobol Job"}
                ],
                "total_results": 2
            }"#,
        )
        .unwrap();

        let meta = first_hit(body).unwrap();
        assert_eq!(meta.id, Some(CatalogId::Numeric(27205)));
        assert_eq!(meta.title, "Inception");
        assert_eq!(meta.year(), "2010");
        assert_eq!(meta.genres, vec!["Action", "Science Fiction", "Adventure"]);
    }

    #[test]
    fn test_missing_optional_fields_become_empty() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"results": [{"id": 7, "title": "Obscure", "overview": null, "release_date": null}]}"#,
        )
        .unwrap();
        let meta = first_hit(body).unwrap();
        assert_eq!(meta.overview, "");
        assert_eq!(meta.release_date, "");
        assert!(meta.genres.is_empty());
    }

    #[test]
    fn test_no_results() {
        let body: SearchResponse = serde_json::from_str(r#"{"page": 1, "results": []}"#).unwrap();
        assert!(first_hit(body).is_none());

        let body: SearchResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(first_hit(body).is_none());
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let config = CatalogConfig {
            api_key_env: "MOVIEHUB_TEST_UNSET_TMDB_KEY".to_string(),
            ..CatalogConfig::default()
        };
        let err = TmdbResolver::new(&config).err().unwrap();
        assert!(matches!(err, MovieHubError::Config(_)));
    }
}
