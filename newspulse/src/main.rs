/*
newspulse - single-binary main.rs
Starts the Rocket HTTP server that fetches news, scores sentiment and serves
the dashboard.
*/

use anyhow::Result;
use clap::Parser;
use common::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use newspulse::newsapi::{NewsApiProvider, NewsProvider};
use newspulse::server::launch_rocket;

#[derive(Parser, Debug)]
#[command(name = "newspulse", about = "Newspulse news + sentiment dashboard server")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI args
    let args = Args::parse();

    // Pick up NEWSAPI_KEY and friends from a local .env if present
    dotenv::dotenv().ok();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() {
            Some(p)
        } else {
            None
        }
    };

    // Load configuration with defaults
    let config = match Config::load_with_defaults(
        if default_path.exists() {
            Some(&default_path)
        } else {
            None
        },
        override_path.as_deref(),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    info!(default = ?default_path, override = ?override_path, "configuration loaded");

    // Initialize the news provider. A missing API key is not fatal: the
    // server starts anyway and searches report the problem to the dashboard.
    let provider: Option<Arc<dyn NewsProvider>> = match NewsApiProvider::from_config(&config.newsapi)
    {
        Ok(p) => {
            info!(endpoint = config.newsapi.base_url(), "NewsAPI provider initialized");
            Some(Arc::new(p))
        }
        Err(e) => {
            warn!(%e, "NewsAPI provider not available");
            None
        }
    };

    // Launch the Rocket server (blocking until Rocket shuts down)
    info!("Launching Rocket HTTP server");
    launch_rocket(Arc::new(config), provider).await?;

    info!("Shutdown complete");
    Ok(())
}
