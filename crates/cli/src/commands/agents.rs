//! `relaydesk agents`: List the agent registry.

pub fn run() -> anyhow::Result<()> {
    let registry = relaydesk_agent::default_registry()?;

    println!("  {} agents registered\n", registry.len());
    for agent in registry.iter() {
        let first_line = agent
            .instructions()
            .split(". ")
            .next()
            .unwrap_or_default();
        println!("  {:<22} {first_line}", agent.name());
    }
    println!();

    Ok(())
}
