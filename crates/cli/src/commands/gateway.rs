//! `habitcoach gateway`: Start the HTTP API server.

use habitcoach_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("HabitCoach Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Provider:  {} ({})", config.default_provider, config.active_model());
    println!("   Store:     {}", config.store.backend);
    println!("   Ledger:    {} (overdraft: {})", config.ledger.backend, config.ledger.overdraft);

    habitcoach_gateway::start(config).await?;

    Ok(())
}
