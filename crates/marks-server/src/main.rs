//! Marks server
//!
//! JSON HTTP API for the Marks bookmark store.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use marks_core::{Config, Store};

mod api;

#[derive(Parser)]
#[command(name = "marks-server")]
#[command(about = "Marks - bookmark manager HTTP API")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.config/marks/config.toml or MARKS_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding data.json
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:5000
    #[arg(short, long)]
    listen: Option<String>,

    /// Category id given to imported bookmarks that have none
    #[arg(long)]
    import_category_id: Option<i64>,
}

impl Cli {
    /// Resolve configuration; flags win over env and file
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from_path(path)
                .with_context(|| format!("Failed to load configuration from {:?}", path))?,
            None => Config::load().context("Failed to load configuration")?,
        };

        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if let Some(id) = self.import_category_id {
            config.import_category_id = Some(id);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_config()?;
    let listen = config.listen.clone();
    let store = Arc::new(Store::new(config));

    let listener = TcpListener::bind(&listen)
        .await
        .with_context(|| format!("Failed to bind {}", listen))?;
    info!(
        addr = %listen,
        data = %store.data_path().display(),
        "server is live"
    );

    axum::serve(listener, api::router(store))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
