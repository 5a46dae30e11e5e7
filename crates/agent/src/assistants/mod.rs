//! The five assistants and the agents they run.
//!
//! Every agent is plain data registered in one [`AgentRegistry`]; the
//! assistants refer to them by name and are validated against the registry
//! when they are built.

pub mod code_review;
pub mod news_digest;
pub mod study;
pub mod support;
pub mod travel;

use std::sync::Arc;

use relaydesk_config::AppConfig;
use relaydesk_core::agent::{AgentDefinition, AgentRegistry};
use relaydesk_core::error::{Error, RegistryError};

pub use code_review::{CodeReview, CodeReviewAssistant};
pub use news_digest::{NewsDigest, NewsDigestAssistant};
pub use study::{StudyAssistant, StudyPlan, StudyRequest, StudySource};
pub use support::{KnowledgeBase, Resolution, SupportAssistant, SupportReply, SupportState};
pub use travel::{TravelAssistant, TravelType, TripPlan, TripRequest};

const AGENTS: &[(&str, &str)] = &[
    (
        code_review::ANALYZER,
        "You are a code review assistant. Analyze the given code, whatever its \
         language, and find problems such as syntax errors, poor structure, bad \
         naming and missing comments or documentation. Output a structured list \
         of the problems you detect.",
    ),
    (
        code_review::SUGGESTION,
        "You receive a list of code issues found by the Analyzer Agent. For each \
         issue, suggest an improvement or fix as a bullet point. Give actionable \
         advice that fits the language used.",
    ),
    (
        code_review::DOCUMENTATION,
        "Write documentation for the given code, whatever its language. Include \
         function, class and module descriptions and an optional README-style \
         summary. Format the output in markdown.",
    ),
    (
        support::INQUIRY,
        "You are a helpful customer support agent answering general questions \
         about delivery time, product availability and payment options. You may \
         call the local FAQ by writing search_faq(\"your query\") to verify an \
         answer. If the question is complicated or unclear, reply with the keyword \
         escalate_to_human. If the user talks about a return, reply with the \
         keyword escalate_to_returns.",
    ),
    (
        support::RETURNS,
        "You are a returns specialist. When a user wants to return something, ask \
         for the order details and guide them with the return policy. If the issue \
         is unclear, forward it with the keyword escalate_to_human.",
    ),
    (
        support::ESCALATION,
        "You handle difficult or unclear customer queries passed on by the Inquiry \
         or Returns agents. Draft a careful response that human staff will review \
         before it is sent.",
    ),
    (
        news_digest::SEARCH,
        "You are a news search assistant. Given a topic, find 3 to 5 recent news \
         articles from the last 7 days that are directly related to it. Return \
         only a JSON list of articles with the fields title, summary, source and \
         date (YYYY-MM-DD).",
    ),
    (
        news_digest::FILTER,
        "Review the list of articles you are given. Remove any article older than \
         7 days and any article from an unknown or unreliable source. Return only \
         the remaining articles in the same JSON format, without explanations.",
    ),
    (
        news_digest::DIGEST,
        "Summarize each article in one concise sentence that names the title, the \
         main point and the source. Return only a markdown digest of 3 to 5 bullet \
         points.",
    ),
    (
        study::SCHEDULER,
        "You are a study planner. You receive raw notes or a topic together with a \
         deadline. Identify the important topics and subtopics, then build a daily \
         study plan that finishes before the deadline. Use the format \
         'Day 1: Topic/Subtopic' followed by '- [Resource Title](https://url)' lines.",
    ),
    (
        study::RESEARCHER,
        "Find 3 to 5 trusted online learning resources for the given topic, such as \
         Coursera, Google ML, FastAI or Kaggle. Only academic or trusted sources, no \
         promotional sites. Output markdown lines of the form \
         '- [Resource Title](https://url)'.",
    ),
    (
        study::SUMMARIZER,
        "Summarize the given research content in a concise academic tone, in at \
         most 100 words.",
    ),
    (
        travel::DESTINATION,
        "You are an expert travel guide. Given a country, its cities, the group \
         type and the trip duration, recommend the top attractions in each city, \
         weighing cultural importance, popularity, suitability for the group and \
         safety. Format in markdown: each city name in bold followed by bulleted \
         attractions with a one-line reason. Do not include costs.",
    ),
    (
        travel::BUDGET,
        "You are a travel budget assistant. Estimate the cost of the trip for local \
         travel only, within the selected country: transport between cities, \
         accommodation, meals and attractions. Never assume international flights. \
         Use the format '- Local Transport: $...', '- Hotel: $...', '- Food: $...', \
         '- Activities: $...', '- Total: $...', '- Comment: Within/Over Budget' with \
         a suggestion when over budget.",
    ),
    (
        travel::QA,
        "You are a helpful travel assistant. Answer follow-up questions about the \
         user's planned trip using the trip information provided. Be concise, \
         accurate and friendly. If you do not know the answer, say so.",
    ),
];

/// Every agent the assistants use, in a stable order.
pub fn default_registry() -> Result<AgentRegistry, RegistryError> {
    let mut registry = AgentRegistry::new();
    for (name, instructions) in AGENTS {
        registry.register(AgentDefinition::new(*name, *instructions))?;
    }
    Ok(registry)
}

/// All five assistants over one shared registry.
pub struct Assistants {
    registry: Arc<AgentRegistry>,
    pub code_review: CodeReviewAssistant,
    pub support: SupportAssistant,
    pub news: NewsDigestAssistant,
    pub study: StudyAssistant,
    pub travel: TravelAssistant,
}

impl Assistants {
    pub fn new(registry: Arc<AgentRegistry>, config: &AppConfig) -> Result<Self, Error> {
        Ok(Self {
            code_review: CodeReviewAssistant::new(registry.clone())?,
            support: SupportAssistant::new(registry.clone(), KnowledgeBase::from(&config.support))?,
            news: NewsDigestAssistant::new(registry.clone())?,
            study: StudyAssistant::new(registry.clone(), config.study.clone())?,
            travel: TravelAssistant::new(registry.clone(), config.travel.clone())?,
            registry,
        })
    }

    /// Build everything from the default registry.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Self::new(Arc::new(default_registry()?), config)
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_every_agent_once() {
        let registry = default_registry().unwrap();
        assert_eq!(registry.len(), 15);
        for (name, _) in AGENTS {
            assert!(registry.contains(name), "missing {name}");
        }
    }

    #[test]
    fn instructions_are_distinct() {
        let registry = default_registry().unwrap();
        let mut prompts: Vec<_> = registry.iter().map(|a| a.instructions()).collect();
        prompts.sort_unstable();
        prompts.dedup();
        assert_eq!(prompts.len(), registry.len());
    }

    #[test]
    fn inquiry_prompt_names_its_routing_tokens() {
        let registry = default_registry().unwrap();
        let inquiry = registry.get(support::INQUIRY).unwrap();
        assert!(inquiry.instructions().contains("search_faq"));
        assert!(inquiry.instructions().contains("escalate_to_human"));
        assert!(inquiry.instructions().contains("escalate_to_returns"));
    }

    #[test]
    fn assistants_build_from_default_config() {
        let assistants = Assistants::from_config(&AppConfig::default()).unwrap();
        assert_eq!(assistants.registry().len(), 15);
    }
}
