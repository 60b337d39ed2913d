use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MovieHubError, Result};

/// Top-level configuration for MovieHub.
///
/// Loaded from `~/.moviehub/config.toml` by default. Secrets (API keys and
/// tokens) are never stored here; the file only names the environment
/// variables that hold them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovieHubConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

impl MovieHubConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MovieHubConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject combinations that cannot work at runtime.
    pub fn validate(&self) -> Result<()> {
        if self.catalog.timeout_secs == 0 {
            return Err(MovieHubError::Config(
                "catalog.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.remote.mode != RemoteMode::Disabled {
            if self.remote.timeout_secs == 0 {
                return Err(MovieHubError::Config(
                    "remote.timeout_secs must be greater than zero".to_string(),
                ));
            }
            if !self.remote.repository.contains('/') {
                return Err(MovieHubError::Config(format!(
                    "remote.repository must look like 'owner/name', got '{}'",
                    self.remote.repository
                )));
            }
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Root directory of the generated site (pages, index, homepage).
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// HTTP port for the publish server.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "./site".to_string(),
            log_level: "info".to_string(),
            port: 5000,
        }
    }
}

/// Layout of the generated site. Every path except `templates_dir` is
/// relative to `general.data_dir` and doubles as the path in the remote store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub templates_dir: String,
    pub movie_template: String,
    pub index_template: String,
    pub pages_dir: String,
    pub index_file: String,
    pub homepage_file: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            templates_dir: "templates".to_string(),
            movie_template: "movie_template.html".to_string(),
            index_template: "index_template.html".to_string(),
            pages_dir: "movies".to_string(),
            index_file: "movies.json".to_string(),
            homepage_file: "index.html".to_string(),
        }
    }
}

impl SiteConfig {
    /// Store-relative path of the page for `page_id`.
    pub fn page_path(&self, page_id: &str) -> String {
        format!("{}/{}.html", self.pages_dir.trim_end_matches('/'), page_id)
    }

    pub fn templates_path(&self) -> PathBuf {
        PathBuf::from(&self.templates_dir)
    }
}

/// External metadata catalog (TMDB) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub api_base: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// Optional ISO language for localized titles, e.g. "en-US".
    pub language: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.themoviedb.org/3".to_string(),
            api_key_env: "TMDB_API_KEY".to_string(),
            timeout_secs: 10,
            language: None,
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// How published artifacts are replicated to the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteMode {
    /// Replicate before answering the publish request.
    Sync,
    /// Answer immediately and replicate in a tracked background job.
    Deferred,
    /// Keep artifacts local only.
    Disabled,
}

/// Remote versioned store (GitHub contents API) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub mode: RemoteMode,
    pub api_base: String,
    /// `owner/name` of the repository that mirrors the site.
    pub repository: String,
    pub branch: String,
    /// Environment variable holding the access token.
    pub token_env: String,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            mode: RemoteMode::Disabled,
            api_base: "https://api.github.com".to_string(),
            repository: String::new(),
            branch: "main".to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
            timeout_secs: 15,
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
