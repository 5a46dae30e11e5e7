//! `relaydesk travel`: Plan a trip, then take follow-up questions on stdin.

use std::io::Write;

use relaydesk_agent::{SessionContext, SessionId, TripRequest};
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(request: TripRequest) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let (client, assistants) = super::connect(&config)?;
    let mut session = SessionContext::new(SessionId::new());

    eprintln!("  Planning your trip...");
    let plan = assistants.travel.plan(&client, &mut session, &request).await?;

    super::section("Trip", &plan.trip.context());
    super::section("Top Attractions", &plan.destinations);
    super::section("Estimated Budget", &plan.budget);

    println!();
    println!("  Ask follow-up questions about your trip.");
    println!("  Type 'exit' or press Ctrl+D to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        match assistants.travel.ask(&client, &mut session, question).await {
            Ok(answer) => {
                println!();
                for line in answer.lines() {
                    println!("  Assistant > {line}");
                }
                println!();
            }
            Err(e) => {
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    println!();
    println!("  {} question(s) answered. Safe travels!", session.qna_history.len());
    println!();

    Ok(())
}
