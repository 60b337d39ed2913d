//! CLI argument definitions for the MovieHub binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// MovieHub - publish movie pages from a title to a static site.
#[derive(Parser, Debug)]
#[command(name = "moviehub", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// HTTP server port.
    #[arg(short = 'p', long = "port", global = true)]
    pub port: Option<u16>,

    /// Site root holding pages, movies.json and index.html.
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Publish one title and print the result as JSON.
    Publish {
        /// Movie title to look up.
        title: String,
    },
    /// Write the bundled templates into the templates directory.
    Init,
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }

    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > MOVIEHUB_CONFIG env var > ~/.moviehub/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("MOVIEHUB_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the server port.
    ///
    /// Priority: --port flag > MOVIEHUB_PORT env var > config file value > 5000.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("MOVIEHUB_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        if config_port != 0 {
            return config_port;
        }
        5000
    }

    /// Resolve the site root. `None` keeps the config value.
    pub fn resolve_data_dir(&self) -> Option<String> {
        self.data_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".moviehub").join("config.toml");
    }
    PathBuf::from("config.toml")
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let args = CliArgs::parse_from(["moviehub"]);
        assert_eq!(args.command(), Command::Serve);
        assert!(args.resolve_data_dir().is_none());
    }

    #[test]
    fn test_publish_subcommand_with_global_flags() {
        let args = CliArgs::parse_from(["moviehub", "publish", "The Matrix", "--data-dir", "/srv/site"]);
        assert_eq!(
            args.command(),
            Command::Publish {
                title: "The Matrix".to_string()
            }
        );
        assert_eq!(args.resolve_data_dir().as_deref(), Some("/srv/site"));
    }

    #[test]
    fn test_flags_win_over_config() {
        let args = CliArgs::parse_from(["moviehub", "-p", "8080", "-c", "/etc/moviehub.toml", "-l", "debug"]);
        assert_eq!(args.resolve_port(5000), 8080);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/etc/moviehub.toml"));
        assert_eq!(args.resolve_log_level().as_deref(), Some("debug"));
    }

    #[test]
    fn test_expand_home_leaves_plain_paths() {
        assert_eq!(expand_home("./site"), PathBuf::from("./site"));
        assert_eq!(expand_home("/var/site"), PathBuf::from("/var/site"));
    }
}
