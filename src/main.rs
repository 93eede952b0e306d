//! Clipdrop - pre-signed upload URL service for MP4 videos

use clap::Parser;
use clipdrop::metrics::server::MetricsServer;
use clipdrop::{config::Config, logging, server::Server};
use std::path::PathBuf;
use tracing::info;

/// Clipdrop - issues pre-signed S3 upload URLs for MP4 videos
#[derive(Parser, Debug)]
#[command(name = "clipdrop")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults plus AWS_* environment variables when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level or filter directive (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Override the listen address
    #[arg(short, long)]
    address: Option<String>,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match args.config {
        Some(ref path) => Config::load(path)?,
        None => Config::from_env()?,
    };

    if let Some(address) = args.address {
        config.server.address = address;
        config.validate()?;
    }

    if args.check {
        println!("Configuration OK");
        return Ok(());
    }

    logging::init_logging(&config.logging, args.log_level.as_deref())?;

    info!("Starting Clipdrop v{}", clipdrop::VERSION);
    match args.config {
        Some(ref path) => info!("Loaded configuration from {:?}", path),
        None => info!("Loaded configuration from environment"),
    }

    let mut metrics_server = if config.metrics.enabled {
        let mut server = MetricsServer::from_config(&config.metrics);
        let addr = server.start().await?;
        info!("Metrics available at http://{}/metrics", addr);
        Some(server)
    } else {
        None
    };

    let server = Server::new(config).await?;
    server.run().await?;

    if let Some(ref mut metrics_server) = metrics_server {
        metrics_server.shutdown().await;
    }

    Ok(())
}
