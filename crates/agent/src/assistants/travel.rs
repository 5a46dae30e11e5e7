//! Travel planner: attractions per city, a local-cost budget, then
//! follow-up questions answered against the stored trip summary.

use std::fmt;
use std::sync::Arc;

use relaydesk_config::TravelConfig;
use relaydesk_core::agent::{AgentDefinition, AgentRegistry};
use relaydesk_core::error::{Error, PipelineError, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::CompletionClient;
use crate::pipeline::{LinearPipeline, PipelineStage};
use crate::session::SessionContext;

pub const DESTINATION: &str = "Destination Agent";
pub const BUDGET: &str = "Budget Agent";
pub const QA: &str = "Q&A Agent";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TravelType {
    #[default]
    #[serde(alias = "solo")]
    Solo,
    #[serde(alias = "friends")]
    Friends,
    #[serde(alias = "family")]
    Family,
}

impl TravelType {
    fn default_group_size(&self) -> u32 {
        match self {
            TravelType::Solo => 1,
            TravelType::Friends => 2,
            TravelType::Family => 4,
        }
    }

    fn min_group_size(&self) -> u32 {
        match self {
            TravelType::Solo | TravelType::Friends => 1,
            TravelType::Family => 2,
        }
    }
}

impl fmt::Display for TravelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TravelType::Solo => "Solo",
            TravelType::Friends => "Friends",
            TravelType::Family => "Family",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for TravelType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solo" => Ok(TravelType::Solo),
            "friends" => Ok(TravelType::Friends),
            "family" => Ok(TravelType::Family),
            other => Err(ValidationError::Invalid {
                field: "travel_type",
                reason: format!("'{other}' is not one of Solo, Friends, Family"),
            }),
        }
    }
}

/// A trip as submitted. Unset numbers take the planner's defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripRequest {
    pub country: String,
    /// Comma-separated city names.
    pub cities: String,
    #[serde(default)]
    pub travel_type: TravelType,
    #[serde(default)]
    pub group_size: Option<u32>,
    #[serde(default)]
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub budget_usd: Option<f64>,
}

/// A checked trip, ready to prompt with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub country: String,
    pub cities: Vec<String>,
    pub travel_type: TravelType,
    pub group_size: u32,
    pub duration_days: u32,
    pub budget_usd: f64,
}

impl Trip {
    /// The trip facts block sent to the destination agent and kept as the
    /// session's trip summary.
    pub fn context(&self) -> String {
        format!(
            "Country: {}\nCities: {}\nTravel Type: {}\nGroup Size: {}\nTrip Duration: {} days\nBudget: ${}",
            self.country,
            self.cities.join(", "),
            self.travel_type,
            self.group_size,
            self.duration_days,
            self.budget_usd,
        )
    }

    fn budget_prompt(&self, destinations: &str) -> String {
        format!(
            "Trip Destinations:\n{destinations}\nCountry: {}\nDuration: {} days\nGroup: {} ({})\nBudget Limit: ${}",
            self.country, self.duration_days, self.group_size, self.travel_type, self.budget_usd,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPlan {
    pub trip: Trip,
    pub destinations: String,
    pub budget: String,
}

/// Split on commas, trim, drop empties, title-case each name.
pub fn parse_cities(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(title_case)
        .collect()
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
fn title_case(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut in_word = false;
    for c in word.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

pub struct TravelAssistant {
    registry: Arc<AgentRegistry>,
    qa: Arc<AgentDefinition>,
    limits: TravelConfig,
}

impl TravelAssistant {
    pub fn new(registry: Arc<AgentRegistry>, limits: TravelConfig) -> Result<Self, PipelineError> {
        let qa = registry.get(QA).ok_or_else(|| PipelineError::UnknownAgent {
            stage: "qa".into(),
            agent: QA.into(),
        })?;
        let assistant = Self { registry, qa, limits };
        assistant.pipeline(Arc::new(Trip {
            country: String::new(),
            cities: Vec::new(),
            travel_type: TravelType::Solo,
            group_size: 1,
            duration_days: 1,
            budget_usd: 0.0,
        }))?;
        Ok(assistant)
    }

    /// Check a request against the configured limits.
    pub fn validate(&self, request: &TripRequest) -> Result<Trip, ValidationError> {
        let country = request.country.trim();
        if country.is_empty() {
            return Err(ValidationError::MissingField("country"));
        }
        let cities = parse_cities(&request.cities);
        if cities.is_empty() {
            return Err(ValidationError::MissingField("cities"));
        }

        let travel_type = request.travel_type;
        let group_size = request
            .group_size
            .unwrap_or_else(|| travel_type.default_group_size());
        let (min_group, max_group) = match travel_type {
            TravelType::Solo => (1, 1),
            other => (other.min_group_size(), self.limits.max_group_size),
        };
        if !(min_group..=max_group).contains(&group_size) {
            return Err(ValidationError::Invalid {
                field: "group_size",
                reason: format!("{travel_type} trips take {min_group} to {max_group} people"),
            });
        }

        let duration_days = request.duration_days.unwrap_or(5);
        if !(1..=self.limits.max_duration_days).contains(&duration_days) {
            return Err(ValidationError::Invalid {
                field: "duration_days",
                reason: format!("must be between 1 and {}", self.limits.max_duration_days),
            });
        }

        let budget_usd = request.budget_usd.unwrap_or(self.limits.min_budget_usd);
        if !budget_usd.is_finite() || budget_usd < self.limits.min_budget_usd {
            return Err(ValidationError::Invalid {
                field: "budget_usd",
                reason: format!("must be at least {}", self.limits.min_budget_usd),
            });
        }

        Ok(Trip {
            country: country.to_string(),
            cities,
            travel_type,
            group_size,
            duration_days,
            budget_usd,
        })
    }

    fn pipeline(&self, trip: Arc<Trip>) -> Result<LinearPipeline, PipelineError> {
        LinearPipeline::builder("travel_plan", self.registry.clone())
            .stage(PipelineStage::new("destinations", DESTINATION))
            .stage(
                PipelineStage::new("budget", BUDGET)
                    .depends_on("destinations")
                    .with_input(move |ctx| trip.budget_prompt(ctx.output("destinations"))),
            )
            .build()
    }

    /// Plan a trip and store it in the session.
    ///
    /// The session is only touched once both stages succeed.
    pub async fn plan(
        &self,
        client: &CompletionClient,
        session: &mut SessionContext,
        request: &TripRequest,
    ) -> Result<TripPlan, Error> {
        let trip = Arc::new(self.validate(request)?);
        let context = trip.context();

        let mut output = self.pipeline(trip.clone())?.run(client, &context).await?;
        let plan = TripPlan {
            trip: trip.as_ref().clone(),
            destinations: output.take("destinations"),
            budget: output.take("budget"),
        };

        info!(session = %session.id, cities = plan.trip.cities.len(), "Trip planned");
        session.record_trip(context, plan.clone());
        Ok(plan)
    }

    /// Answer a follow-up question and append it to the session history.
    ///
    /// The history keeps the question exactly as submitted; only the prompt
    /// uses the trimmed text.
    pub async fn ask(
        &self,
        client: &CompletionClient,
        session: &mut SessionContext,
        question: &str,
    ) -> Result<String, Error> {
        let trimmed = question.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingField("question").into());
        }
        let summary = session
            .trip_summary
            .as_deref()
            .ok_or(ValidationError::NoTripPlanned)?;

        let prompt = format!("{trimmed}\n\nTrip Info:\n{summary}");
        let answer = client
            .ask(&self.qa, prompt)
            .await
            .map_err(|source| Error::Stage {
                stage: "qa".into(),
                source,
            })?;

        session.push_answer(question, answer.clone());
        Ok(answer)
    }
}
