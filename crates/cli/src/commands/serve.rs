//! `relaydesk serve`: Start the HTTP API server.

use anyhow::anyhow;

pub async fn run(port_override: Option<u16>) -> anyhow::Result<()> {
    let mut config = super::load_config()?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("RelayDesk Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.default_model);

    relaydesk_gateway::start(config)
        .await
        .map_err(|e| anyhow!("Gateway stopped: {e}"))?;

    Ok(())
}
