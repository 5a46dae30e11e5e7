//! RelayDesk CLI: the main entry point.
//!
//! Commands:
//! - `serve`    - Start the HTTP gateway
//! - `review`   - Review one source file
//! - `support`  - Answer a customer support query
//! - `news`     - News digest for a topic
//! - `study`    - Study plan from a topic or PDF notes
//! - `travel`   - Plan a trip, then ask follow-up questions
//! - `agents`   - List the registered agents
//! - `doctor`   - Diagnose configuration

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use relaydesk_agent::TravelType;

mod commands;

#[derive(Parser)]
#[command(
    name = "relaydesk",
    about = "RelayDesk: multi-agent assistants over one completion API",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Analyze, suggest fixes for and document a source file
    Review {
        /// Path to the source file
        file: PathBuf,
    },

    /// Ask the customer support desk
    Support {
        /// The customer's question
        query: String,
    },

    /// Build a news digest for a topic
    News {
        /// Topic to search for
        topic: String,
    },

    /// Build a study plan from notes or a topic
    Study {
        /// Topic to study when no notes are given
        #[arg(short, long)]
        topic: Option<String>,

        /// PDF notes; take precedence over the topic
        #[arg(long)]
        pdf: Option<PathBuf>,

        /// Deadline as YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        deadline: Option<NaiveDate>,
    },

    /// Plan a trip, then answer follow-up questions interactively
    Travel {
        #[arg(long)]
        country: String,

        /// Comma-separated city names
        #[arg(long)]
        cities: String,

        /// Solo, Friends or Family
        #[arg(long, default_value = "solo")]
        travel_type: TravelType,

        #[arg(long)]
        group_size: Option<u32>,

        /// Trip duration in days
        #[arg(long)]
        days: Option<u32>,

        /// Budget in USD
        #[arg(long)]
        budget: Option<f64>,
    },

    /// List every registered agent
    Agents,

    /// Diagnose configuration
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Review { file } => commands::review::run(file).await?,
        Commands::Support { query } => commands::support::run(query).await?,
        Commands::News { topic } => commands::news::run(topic).await?,
        Commands::Study {
            topic,
            pdf,
            deadline,
        } => commands::study::run(topic, pdf, deadline).await?,
        Commands::Travel {
            country,
            cities,
            travel_type,
            group_size,
            days,
            budget,
        } => {
            let request = relaydesk_agent::TripRequest {
                country,
                cities,
                travel_type,
                group_size,
                duration_days: days,
                budget_usd: budget,
            };
            commands::travel::run(request).await?
        }
        Commands::Agents => commands::agents::run()?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
