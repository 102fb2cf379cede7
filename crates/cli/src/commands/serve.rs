//! `windlass serve`: start the HTTP API server.

use tracing::info;
use windlass_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("⚓ Windlass Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Reasoner:  {} @ {}", config.reasoner.model, config.reasoner.base_url);
    info!("Starting gateway");

    windlass_gateway::start(config).await?;

    Ok(())
}
