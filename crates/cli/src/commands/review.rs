//! `relaydesk review`: Three-stage code review of one file.

use std::path::PathBuf;

use anyhow::{Context, anyhow};

pub async fn run(file: PathBuf) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let (client, assistants) = super::connect(&config)?;

    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("'{}' has no usable file name", file.display()))?;
    let bytes = tokio::fs::read(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    eprint!("  Reviewing {filename}...");
    let review = assistants
        .code_review
        .review_file(&client, filename, bytes)
        .await;
    eprint!("\r{}\r", " ".repeat(filename.len() + 16));
    let review = review?;

    super::section("Detected Issues", &review.analysis);
    super::section("Suggestions", &review.suggestions);
    super::section("Documentation", &review.documentation);
    println!();

    Ok(())
}
