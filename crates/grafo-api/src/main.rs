//! Grafo HTTP server binary.

use clap::Parser;
use grafo_api::cli::Args;
use grafo_api::GrafoServer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Example: RUST_LOG=grafo=debug,grafo_api=debug grafo-api
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("grafo=info,grafo_api=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config().await?;
    tracing::info!(bind = %config.bind, max_sessions = config.max_sessions, "Starting grafo-api");

    GrafoServer::new(config).run().await?;
    Ok(())
}
