//! random-names: serves random baby names over a length-prefixed TCP protocol.
//!
//! Configuration via CLI arguments or TOML file.

use random_names::{Config, HttpCatalog, NameCatalog, Server};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        listen = %config.listen,
        max_connections = config.max_connections,
        header_width = config.header_width,
        catalog = %config.catalog_url,
        request_timeout_secs = config.request_timeout.as_secs(),
        "Starting random-names server"
    );

    let provider = HttpCatalog::new(config.catalog_url.clone(), config.request_timeout)?;
    let catalog = NameCatalog::new(provider, config.page_size, config.sample_size);
    let server = Server::bind(&config, catalog)?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
