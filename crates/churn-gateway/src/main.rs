//! Churn prediction gateway - HTTP entry point.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use churn_gateway::config::AppConfig;
use churn_gateway::handler::ChurnHandler;
use churn_gateway::metrics::MetricsRegistry;
use churn_gateway::server::{serve, ServerState};
use churn_model::cache::PredictorCache;

/// Churn prediction gateway
#[derive(Parser, Debug)]
#[command(name = "churn-gateway")]
#[command(version)]
#[command(about = "Serves churn predictions over HTTP", long_about = None)]
struct Args {
    /// Configuration file path (falls back to CHURN_CONFIG, then defaults)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the HTTP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Load artifacts before accepting requests
    #[arg(long)]
    preload: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::from_env()?,
    };
    if let Some(port) = args.port {
        config.http.port = port;
    }

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    tracing::info!("Starting {} v{}", config.name, env!("CARGO_PKG_VERSION"));

    let cache = Arc::new(PredictorCache::from_locator(config.artifacts.locator()));
    let metrics = Arc::new(MetricsRegistry::new());

    if args.preload {
        // A failed preload is retried on the first request
        if let Err(e) = cache.ensure_ready().await {
            tracing::warn!("Preload failed: {}", e);
        }
        metrics.set_load_attempts(cache.load_attempts());
    }

    let state = Arc::new(ServerState::new(ChurnHandler::new(cache, metrics)));
    serve(&config, state).await?;

    tracing::info!("Gateway shutdown complete");
    Ok(())
}
