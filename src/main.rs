use anyhow::{Context, Result};
use clap::Parser;
use field_scribe::{create_router, AppState, Config, DeepgramConnector, HttpGenerator};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "field-scribe", about = "Live transcript to structured field extraction")]
struct Args {
    /// Configuration file (extension optional)
    #[arg(long, default_value = "config/field-scribe")]
    config: String,

    /// Override the HTTP bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        cfg.service.http.bind = bind;
    }
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }

    info!("Field Scribe v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    if cfg.transcription.api_key.is_empty() {
        warn!("No transcription API key configured");
    }
    if cfg.extraction.api_key.is_empty() {
        warn!("No extraction API key configured");
    }
    info!(
        "Extraction every {}s with {} (timeout {}s)",
        cfg.extraction.interval_secs, cfg.extraction.model, cfg.extraction.timeout_secs
    );

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let connector = Arc::new(DeepgramConnector::new(cfg.transcription.clone()));
    let generator = Arc::new(HttpGenerator::new(cfg.extraction.clone()));
    let router = create_router(AppState::new(cfg, connector, generator));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
