pub mod agents;
pub mod doctor;
pub mod news;
pub mod review;
pub mod serve;
pub mod study;
pub mod support;
pub mod travel;

use anyhow::{Context, bail};
use relaydesk_agent::{Assistants, CompletionClient};
use relaydesk_config::AppConfig;

pub(crate) fn load_config() -> anyhow::Result<AppConfig> {
    AppConfig::load().context("Failed to load config")
}

/// Completion client plus assistants, or a setup hint when no key is set.
pub(crate) fn connect(config: &AppConfig) -> anyhow::Result<(CompletionClient, Assistants)> {
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables (or put it in .env):");
        eprintln!("    RELAYDESK_API_KEY=...   (highest priority)");
        eprintln!("    GEMINI_API_KEY=...");
        eprintln!("    OPENAI_API_KEY=...");
        eprintln!();
        eprintln!("  Or add api_key to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        bail!("No API key found. See above for setup instructions.");
    }

    let client = CompletionClient::from_config(config).context("Failed to build completion client")?;
    let assistants = Assistants::from_config(config).context("Failed to build assistants")?;
    Ok((client, assistants))
}

/// Print a titled block, indented like the rest of the CLI output.
pub(crate) fn section(title: &str, body: &str) {
    println!();
    println!("  ── {title} ──");
    for line in body.trim().lines() {
        println!("  {line}");
    }
}
