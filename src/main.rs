mod config;
mod llm;
mod platform;
mod relay;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::llm::LlmClient;
use crate::relay::RelayHandler;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,relaybot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Credentials are checked before anything touches the network
    let config = Config::load().context("Failed to load configuration")?;

    info!("Configuration loaded successfully");
    info!("  Model: {}", config.llm.model);
    info!("  OpenRouter endpoint: {}", config.llm.completions_url());
    info!("  Completion timeout: {}s", config.llm.timeout.as_secs());

    let llm = LlmClient::new(config.llm.clone()).context("Failed to create HTTP client")?;
    let relay = Arc::new(RelayHandler::new(Arc::new(llm)));

    info!("Bot is starting...");
    platform::telegram::run(&config.telegram, relay).await?;

    Ok(())
}
