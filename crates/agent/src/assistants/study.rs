//! Study planner: a dated plan, trusted resources and a short summary,
//! from uploaded notes or a bare topic.

use std::sync::Arc;

use chrono::NaiveDate;
use relaydesk_config::StudyConfig;
use relaydesk_core::agent::AgentRegistry;
use relaydesk_core::error::{Error, PipelineError, ValidationError};
use serde::{Deserialize, Serialize};

use crate::client::CompletionClient;
use crate::pipeline::{LinearPipeline, PipelineStage};
use crate::routing::{self, ResourceLink};

pub const SCHEDULER: &str = "Study Scheduler";
pub const RESEARCHER: &str = "Web Researcher";
pub const SUMMARIZER: &str = "Content Summarizer";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudyRequest {
    #[serde(default)]
    pub topic: Option<String>,
    /// Text already extracted from uploaded notes.
    #[serde(default)]
    pub notes: Option<String>,
    pub deadline: Option<NaiveDate>,
}

/// What the plan was built from. Notes win over a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudySource {
    Notes,
    Topic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyPlan {
    pub source: StudySource,
    pub deadline: NaiveDate,
    pub plan: String,
    pub research: String,
    pub resources: Vec<ResourceLink>,
    pub summary: String,
}

pub struct StudyAssistant {
    registry: Arc<AgentRegistry>,
    limits: StudyConfig,
}

impl StudyAssistant {
    pub fn new(registry: Arc<AgentRegistry>, limits: StudyConfig) -> Result<Self, PipelineError> {
        let assistant = Self { registry, limits };
        // Fail at startup, not on the first request, if an agent is missing.
        assistant.pipeline(String::new())?;
        Ok(assistant)
    }

    /// The research stage input is fixed per request, so the chain is
    /// assembled per request too.
    fn pipeline(&self, research_input: String) -> Result<LinearPipeline, PipelineError> {
        LinearPipeline::builder("study", self.registry.clone())
            .stage(PipelineStage::new("plan", SCHEDULER))
            .stage(PipelineStage::new("research", RESEARCHER).with_input(move |_| research_input.clone()))
            .stage(PipelineStage::after("summary", SUMMARIZER, "research"))
            .build()
    }

    pub async fn plan(
        &self,
        client: &CompletionClient,
        request: StudyRequest,
    ) -> Result<StudyPlan, Error> {
        let deadline = request.deadline.unwrap_or_else(|| chrono::Local::now().date_naive());
        let notes = request.notes.filter(|n| !n.trim().is_empty());
        let topic = request
            .topic
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let (source, prompt, research_input) = match (notes, topic) {
            (Some(notes), _) => (
                StudySource::Notes,
                format!("Here are my notes:\n{notes}\nDeadline: {deadline}"),
                excerpt(&notes, self.limits.research_excerpt_chars).to_string(),
            ),
            (None, Some(topic)) => (
                StudySource::Topic,
                format!("Topic: {topic}\nDeadline: {deadline}"),
                topic,
            ),
            (None, None) => return Err(ValidationError::MissingField("topic or notes").into()),
        };

        let mut output = self.pipeline(research_input)?.run(client, &prompt).await?;
        let research = output.take("research");
        let resources = routing::extract_links(&research);
        tracing::info!(?source, resources = resources.len(), "Study plan ready");

        Ok(StudyPlan {
            source,
            deadline,
            plan: output.take("plan"),
            resources,
            research,
            summary: output.take("summary"),
        })
    }
}

/// The first `max_chars` characters of `text`, never splitting a character.
fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
