//! Pattern router server.
//!
//! Serves the static routes declared in a TOML config file through the
//! first-match dispatcher.
//!
//! ```text
//!     Client Request
//!     ─────────────▶ axum serve ─▶ tower-http layers ─▶ Dispatcher
//!                                  (trace, request id,   │ OPTIONS → 200 "ok"
//!                                   timeout)             │ routes in file order
//!                                                        │ none matched → 404
//!     Client Response ◀──────────── response observer ◀──┘ (CORS headers)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use pattern_router::config::{load_config, RouterConfig};
use pattern_router::observability::{logging, metrics};
use pattern_router::HttpServer;

#[derive(Parser)]
#[command(name = "pattern-router")]
#[command(about = "First-match HTTP router serving routes from a config file", long_about = None)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Validate the config and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability.log_filter);
    tracing::info!("pattern-router v{} starting", env!("CARGO_PKG_VERSION"));

    if cli.check {
        tracing::info!(routes = config.routes.len(), "Configuration is valid");
        return Ok(());
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        cors = config.cors.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
