//! Pantry server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use pantry_core::config::AppConfig;
use pantry_fetch::Fetcher;
use pantry_server::{AppState, create_router};
use pantry_storage::PackageStore;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Pantry - a fetch-through cache and proxy for package tarballs
#[derive(Parser, Debug)]
#[command(name = "pantryd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "PANTRY_CONFIG",
        default_value = "config/pantry.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Pantry v{}", env!("CARGO_PKG_VERSION"));

    // Every setting has a default; a config file and PANTRY_ environment
    // variables override it.
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
    let config_path = std::path::Path::new(&args.config);
    if config_path.exists() {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("PANTRY_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    let store = Arc::new(
        PackageStore::new(&config.storage.path)
            .await
            .context("failed to initialize artifact store")?,
    );
    tracing::info!(path = %config.storage.path.display(), "Artifact store initialized");

    let registry = pantry_registry::from_config(&config.registry)
        .await
        .context("failed to load package registry")?;

    let fetcher = Fetcher::new(&config.forwarder).context("failed to build upstream fetcher")?;
    tracing::info!(
        upstream = %config.forwarder.registry,
        auto_forward = config.forwarder.auto_forward,
        "Upstream forwarder configured"
    );

    let state = AppState::new(config, store, registry, fetcher);
    let router = create_router(state.clone());

    let hostname = state.config.server.hostname.clone();
    let port = state.config.server.port;
    let listener = tokio::net::TcpListener::bind((hostname.as_str(), port))
        .await
        .with_context(|| format!("failed to bind {hostname}:{port}"))?;

    tracing::info!(%hostname, port, "Pantry registry proxy started");
    axum::serve(listener, router)
        .await
        .context("server error")?;

    Ok(())
}
