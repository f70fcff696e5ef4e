//! RateMesh Node Binary
//!
//! Serves publish and convert requests for an in-memory rate graph.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ratemesh_fx::ConversionService;
use ratemesh_node::{NodeConfig, RatesHandler, RatesServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = NodeConfig::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting RateMesh node");

    let service = Arc::new(ConversionService::new());
    let server = RatesServer::new(config.clone(), RatesHandler::new(service))?;
    let listener = server.bind().await?;

    info!(
        listen_addr = %config.listen_addr,
        listen_port = %listener.local_addr()?.port(),
        max_connections = config.max_connections,
        max_line_length = config.max_line_length,
        "Node running"
    );

    server
        .serve(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    info!("Node shutdown complete");
    Ok(())
}
