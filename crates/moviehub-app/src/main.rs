//! MovieHub binary - composition root.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Build the catalog resolver and, when enabled, the remote store
//! 3. Run the chosen command: serve, publish one title, or init templates

mod cli;

use std::sync::Arc;

use clap::Parser;

use moviehub_api::{start_server, AppState};
use moviehub_catalog::TmdbResolver;
use moviehub_core::config::{MovieHubConfig, RemoteMode};
use moviehub_core::RemoteStatus;
use moviehub_publish::PublishCoordinator;
use moviehub_remote::{GitHubStore, RemoteStore};
use moviehub_render::PageRenderer;

use cli::{expand_home, CliArgs, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let mut config = MovieHubConfig::load_or_default(&config_file);
    if let Some(dir) = args.resolve_data_dir() {
        config.general.data_dir = dir;
    }
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }
    config.general.port = args.resolve_port(config.general.port);

    // Tracing: RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting MovieHub v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    config.validate()?;

    match args.command() {
        Command::Init => install_templates(&config).await?,
        Command::Publish { title } => {
            let coordinator = build_coordinator(&config)?;
            let result = coordinator.publish(&title).await?;
            // A one-shot run must not exit before its deferred push lands.
            if let (Some(mirror), RemoteStatus::Pending { job_id }) =
                (coordinator.mirror(), &result.remote)
            {
                if let Some(job) = mirror.wait(*job_id).await {
                    tracing::info!(state = ?job.state, "Remote mirror finished");
                }
            }
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Serve => {
            let coordinator = build_coordinator(&config)?;
            start_server(config.general.port, AppState::new(coordinator)).await?;
        }
    }

    Ok(())
}

async fn install_templates(config: &MovieHubConfig) -> moviehub_core::Result<()> {
    let renderer = PageRenderer::from_config(&config.site);
    let written = renderer.install_defaults().await?;
    if written.is_empty() {
        tracing::info!(dir = %renderer.templates_dir().display(), "Templates already present");
    }
    for path in &written {
        tracing::info!(path = %path.display(), "Template installed");
    }
    Ok(())
}

fn build_coordinator(config: &MovieHubConfig) -> moviehub_core::Result<PublishCoordinator> {
    let root = expand_home(&config.general.data_dir);
    std::fs::create_dir_all(&root)?;
    tracing::info!(path = %root.display(), "Site root ready");

    let resolver = Arc::new(TmdbResolver::new(&config.catalog)?);

    let store: Option<Arc<dyn RemoteStore>> = match config.remote.mode {
        RemoteMode::Disabled => {
            tracing::info!("Remote mirroring disabled");
            None
        }
        mode => {
            tracing::info!(
                repository = %config.remote.repository,
                branch = %config.remote.branch,
                mode = ?mode,
                "Remote mirroring enabled"
            );
            Some(Arc::new(GitHubStore::new(&config.remote)?))
        }
    };

    Ok(PublishCoordinator::from_config(config, root, resolver, store))
}
