//! `relaydesk doctor`: Diagnose configuration.

use relaydesk_agent::Assistants;
use relaydesk_config::AppConfig;

pub async fn run() -> anyhow::Result<()> {
    println!("RelayDesk Doctor: System Diagnostics");
    println!("=====================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found at {}", config_path.display());
    } else {
        println!("  ⚠️  No config file at {}: using defaults", config_path.display());
    }

    match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            println!("     Model:   {}", config.default_model);
            println!("     API URL: {}", config.api_url);

            if config.has_api_key() {
                println!("  ✅ API key configured");
            } else {
                println!("  ❌ No API key: set RELAYDESK_API_KEY or add api_key to config.toml");
                issues += 1;
            }

            match Assistants::from_config(&config) {
                Ok(assistants) => println!(
                    "  ✅ Assistants ready ({} agents)",
                    assistants.registry().len()
                ),
                Err(e) => {
                    println!("  ❌ Assistants failed to build: {e}");
                    issues += 1;
                }
            }

            println!(
                "  ✅ {} FAQ entries, {} return policy entries",
                config.support.faq.len(),
                config.support.return_policy.len()
            );
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            issues += 1;
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
