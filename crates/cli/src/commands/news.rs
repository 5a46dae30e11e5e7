//! `relaydesk news`: Search, filter and summarize recent news.

pub async fn run(topic: String) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let (client, assistants) = super::connect(&config)?;

    eprintln!("  Searching news about '{}'...", topic.trim());
    let digest = assistants.news.digest(&client, &topic).await?;

    super::section(&format!("News Digest: {}", digest.topic), &digest.digest);
    println!();

    Ok(())
}
