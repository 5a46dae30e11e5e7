//! `relaydesk study`: Study plan, resources and summary.

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use relaydesk_agent::document::{self, DocumentFormat};
use relaydesk_agent::routing;
use relaydesk_agent::StudyRequest;

pub async fn run(
    topic: Option<String>,
    pdf: Option<PathBuf>,
    deadline: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let (client, assistants) = super::connect(&config)?;

    let notes = match pdf {
        Some(path) => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let text = document::extract_text_blocking(bytes, DocumentFormat::Pdf).await?;
            println!("  Extracted {} characters from {}", text.chars().count(), path.display());
            Some(text)
        }
        None => None,
    };

    let plan = assistants
        .study
        .plan(
            &client,
            StudyRequest {
                topic,
                notes,
                deadline,
            },
        )
        .await?;

    super::section(&format!("Study Plan (due {})", plan.deadline), &plan.plan);
    if plan.resources.is_empty() {
        super::section("Resources", &plan.research);
    } else {
        super::section("Resources", &routing::render_links(&plan.resources));
    }
    super::section("Summary", &plan.summary);
    println!();

    Ok(())
}
