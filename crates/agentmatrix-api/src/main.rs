use agentmatrix_api::{init_tracing, Server};
use agentmatrix_core::ConfigManager;
use anyhow::Context;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigManager::new(None).context("Failed to load configuration")?;
    init_tracing(&config.settings().logging.level);

    let server = Server::new(Arc::new(config.into_settings()))
        .await
        .context("Failed to start API server")?;
    server.run().await?;
    Ok(())
}
