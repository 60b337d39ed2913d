//! GitHub contents API backend.
//!
//! Each blob is a file on one branch of a repository; the file's blob `sha`
//! is the revision token.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use moviehub_core::config::RemoteConfig;
use moviehub_core::error::{MovieHubError, Result};
use moviehub_core::RemoteRevision;

use crate::error::RemoteError;
use crate::store::{RemoteBlob, RemoteStore};

/// Remote store backed by a GitHub repository branch.
pub struct GitHubStore {
    client: reqwest::Client,
    api_base: String,
    repository: String,
    branch: String,
    token: String,
}

impl GitHubStore {
    /// Create a store, reading the token from the environment variable named
    /// in config.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let token = std::env::var(&config.token_env).map_err(|_| {
            MovieHubError::Config(format!(
                "Remote mirroring requires the {} environment variable to be set",
                config.token_env
            ))
        })?;
        Self::with_token(config, token)
    }

    /// Create a store with an explicit token.
    pub fn with_token(config: &RemoteConfig, token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("moviehub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MovieHubError::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(repository = %config.repository, branch = %config.branch, "GitHub store ready");

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            repository: config.repository.clone(),
            branch: config.branch.clone(),
            token: token.into(),
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.api_base,
            self.repository,
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.contents_url(path))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    async fn put(
        &self,
        path: &str,
        content: &str,
        revision: Option<&RemoteRevision>,
        message: &str,
    ) -> std::result::Result<RemoteRevision, RemoteError> {
        let body = PutContents {
            message,
            content: STANDARD.encode(content.as_bytes()),
            branch: &self.branch,
            sha: revision.map(RemoteRevision::as_str),
        };

        let response = self
            .request(reqwest::Method::PUT, path)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(path, e))?;

        let status = response.status();
        if status.is_success() {
            let written: PutResponse = response
                .json()
                .await
                .map_err(|e| RemoteError::Unavailable(format!("{}: {}", path, e)))?;
            debug!(path, %status, sha = %written.content.sha, "GitHub write accepted");
            return Ok(RemoteRevision::new(written.content.sha));
        }

        warn!(path, %status, updating = revision.is_some(), "GitHub write rejected");
        Err(write_error(path, status, revision.is_some()))
    }
}

#[derive(Debug, Serialize)]
struct PutContents<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct FileContents {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: WrittenFile,
}

#[derive(Debug, Deserialize)]
struct WrittenFile {
    sha: String,
}

fn transport_error(path: &str, err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::Timeout(path.to_string())
    } else {
        RemoteError::Unavailable(format!("{}: {}", path, err))
    }
}

/// Map a rejected PUT onto the store's error contract.
///
/// GitHub answers 422 when a create omits the sha of an existing file and
/// 409 when an update names a stale sha.
fn write_error(path: &str, status: StatusCode, updating: bool) -> RemoteError {
    match status {
        StatusCode::UNPROCESSABLE_ENTITY if !updating => RemoteError::AlreadyExists(path.to_string()),
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            RemoteError::RevisionConflict(path.to_string())
        }
        StatusCode::NOT_FOUND if updating => RemoteError::NotFound(path.to_string()),
        _ => RemoteError::Unavailable(format!("{}: HTTP {}", path, status)),
    }
}

/// Decode the base64 payload of a contents response.
fn decode_contents(path: &str, file: FileContents) -> std::result::Result<RemoteBlob, RemoteError> {
    if !file.encoding.is_empty() && file.encoding != "base64" {
        return Err(RemoteError::Encoding(format!(
            "{}: unsupported encoding '{}'",
            path, file.encoding
        )));
    }
    let packed: String = file.content.split_whitespace().collect();
    let bytes = STANDARD
        .decode(packed)
        .map_err(|e| RemoteError::Encoding(format!("{}: {}", path, e)))?;
    let content =
        String::from_utf8(bytes).map_err(|e| RemoteError::Encoding(format!("{}: {}", path, e)))?;
    Ok(RemoteBlob {
        content,
        revision: RemoteRevision::new(file.sha),
    })
}

#[async_trait]
impl RemoteStore for GitHubStore {
    async fn read(&self, path: &str) -> std::result::Result<Option<RemoteBlob>, RemoteError> {
        let response = self
            .request(reqwest::Method::GET, path)
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await
            .map_err(|e| transport_error(path, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let file: FileContents = response
                    .json()
                    .await
                    .map_err(|e| RemoteError::Unavailable(format!("{}: {}", path, e)))?;
                decode_contents(path, file).map(Some)
            }
            status => Err(RemoteError::Unavailable(format!("{}: HTTP {}", path, status))),
        }
    }

    async fn create(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> std::result::Result<RemoteRevision, RemoteError> {
        self.put(path, content, None, message).await
    }

    async fn update(
        &self,
        path: &str,
        content: &str,
        revision: &RemoteRevision,
        message: &str,
    ) -> std::result::Result<RemoteRevision, RemoteError> {
        self.put(path, content, Some(revision), message).await
    }

    fn name(&self) -> &'static str {
        "github"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RemoteConfig {
        RemoteConfig {
            repository: "waterbears/movie-hub".to_string(),
            api_base: "https://api.github.com/".to_string(),
            ..RemoteConfig::default()
        }
    }

    #[test]
    fn test_contents_url() {
        let store = GitHubStore::with_token(&config(), "t").unwrap();
        assert_eq!(
            store.contents_url("movies/inception.html"),
            "https://api.github.com/repos/waterbears/movie-hub/contents/movies/inception.html"
        );
    }

    #[test]
    fn test_decode_wrapped_base64() {
        let encoded = STANDARD.encode("<h1>Inception</h1>");
        let wrapped = format!("{}\n{}\n", &encoded[..8], &encoded[8..]);
        let blob = decode_contents(
            "movies/inception.html",
            FileContents {
                sha: "abc123".into(),
                content: wrapped,
                encoding: "base64".into(),
            },
        )
        .unwrap();
        assert_eq!(blob.content, "<h1>Inception</h1>");
        assert_eq!(blob.revision, RemoteRevision::new("abc123"));
    }

    #[test]
    fn test_decode_rejects_unknown_encoding() {
        let err = decode_contents(
            "big.bin",
            FileContents {
                sha: "x".into(),
                content: String::new(),
                encoding: "none".into(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, RemoteError::Encoding(_)));
    }

    #[test]
    fn test_write_error_mapping() {
        assert_eq!(
            write_error("p", StatusCode::UNPROCESSABLE_ENTITY, false),
            RemoteError::AlreadyExists("p".into())
        );
        assert_eq!(
            write_error("p", StatusCode::CONFLICT, true),
            RemoteError::RevisionConflict("p".into())
        );
        assert_eq!(
            write_error("p", StatusCode::NOT_FOUND, true),
            RemoteError::NotFound("p".into())
        );
        assert!(matches!(
            write_error("p", StatusCode::BAD_GATEWAY, false),
            RemoteError::Unavailable(_)
        ));
    }

    #[test]
    fn test_put_body_omits_sha_on_create() {
        let body = PutContents {
            message: "Add movie Inception",
            content: STANDARD.encode("x"),
            branch: "main",
            sha: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("sha").is_none());
        assert_eq!(json["branch"], "main");
    }

    #[test]
    fn test_missing_token_is_config_error() {
        let config = RemoteConfig {
            token_env: "MOVIEHUB_TEST_UNSET_GITHUB_TOKEN".to_string(),
            ..config()
        };
        let err = GitHubStore::new(&config).err().unwrap();
        assert!(matches!(err, MovieHubError::Config(_)));
    }
}
