//! `relaydesk support`: One customer query through the support desk.

use relaydesk_agent::Resolution;

pub async fn run(query: String) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let (client, assistants) = super::connect(&config)?;

    let reply = assistants.support.handle(&client, &query).await?;

    let source = match reply.resolution {
        Resolution::Faq => "FAQ",
        Resolution::ReturnPolicy => "return policy",
        Resolution::Agent => "agent",
    };
    super::section(&format!("Answer ({source})"), &reply.answer);
    tracing::debug!(path = ?reply.path, model_calls = reply.model_calls, "Support path");
    println!();

    Ok(())
}
