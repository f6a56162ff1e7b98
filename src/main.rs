//! # SkillSwap Server
//!
//! Backend for a peer-to-peer skill exchange marketplace.
//!
//! The entry point wires up tracing, loads settings, then hands off to
//! [`Application`] which owns the pool, the Redis event bus and the
//! HTTP/SSE listener.

use anyhow::Result;
use tracing::info;

use skillswap_server::config::Settings;
use skillswap_server::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    skillswap_server::telemetry::init_tracing();

    info!("Starting SkillSwap Server...");

    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        "Configuration loaded"
    );

    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
