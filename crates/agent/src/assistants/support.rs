//! Customer support: canned answers first, then a routed chain of agents.
//!
//! ```text
//! FAQ-Direct ──match──▶ done (no model call)
//!     │
//!     ▼
//!  Inquiry ──search_faq("q")──▶ FAQ lookup, done
//!     │
//!     ├──escalate_to_returns──▶ return policy ──match──▶ done
//!     │                              │
//!     │                              ▼
//!     │                           Returns
//!     ▼                              │
//!  escalate_to_human in current text? ◀─┘
//!     │
//!     ▼
//!  Escalation
//! ```
//!
//! States are visited in that order and never twice.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use relaydesk_config::{FaqEntry, SupportConfig};
use relaydesk_core::agent::{AgentDefinition, AgentRegistry};
use relaydesk_core::error::{Error, PipelineError, ValidationError};
use relaydesk_core::event::DomainEvent;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::CompletionClient;
use crate::routing::{self, EscalationTarget, Marker, RouteDecision};

pub const INQUIRY: &str = "Inquiry Agent";
pub const RETURNS: &str = "Returns Agent";
pub const ESCALATION: &str = "Escalation Agent";

/// Local canned data the support flow answers from without a model.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    faq: Vec<FaqEntry>,
    faq_fallback: String,
    return_policy: Vec<FaqEntry>,
    return_policy_fallback: String,
}

impl From<&SupportConfig> for KnowledgeBase {
    fn from(config: &SupportConfig) -> Self {
        Self {
            faq: config.faq.clone(),
            faq_fallback: config.faq_fallback.clone(),
            return_policy: config.return_policy.clone(),
            return_policy_fallback: config.return_policy_fallback.clone(),
        }
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::from(&SupportConfig::default())
    }
}

/// First entry whose question contains the lowercased query.
///
/// The query is not trimmed: surrounding whitespace is part of the match.
/// A blank query matches nothing.
fn lookup<'a>(entries: &'a [FaqEntry], query: &str) -> Option<&'a str> {
    if query.trim().is_empty() {
        return None;
    }
    let query = query.to_lowercase();
    entries
        .iter()
        .find(|e| e.question.to_lowercase().contains(&query))
        .map(|e| e.answer.as_str())
}

impl KnowledgeBase {
    pub fn faq_answer(&self, query: &str) -> Option<&str> {
        lookup(&self.faq, query)
    }

    pub fn return_policy_answer(&self, query: &str) -> Option<&str> {
        lookup(&self.return_policy, query)
    }

    /// FAQ answer or the "not found" text.
    pub fn search_faq(&self, query: &str) -> &str {
        self.faq_answer(query).unwrap_or(&self.faq_fallback)
    }

    /// Return-policy answer or the "not found" text.
    pub fn search_return_policy(&self, query: &str) -> &str {
        self.return_policy_answer(query)
            .unwrap_or(&self.return_policy_fallback)
    }
}

/// States of the support flow, in traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportState {
    FaqDirect,
    Inquiry,
    Returns,
    Escalation,
}

/// Where the final answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Faq,
    ReturnPolicy,
    Agent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportReply {
    pub answer: String,
    pub resolution: Resolution,
    pub path: Vec<SupportState>,
    pub model_calls: usize,
}

pub struct SupportAssistant {
    inquiry: Arc<AgentDefinition>,
    returns: Arc<AgentDefinition>,
    escalation: Arc<AgentDefinition>,
    knowledge: KnowledgeBase,
}

fn agent(registry: &AgentRegistry, stage: &str, name: &str) -> Result<Arc<AgentDefinition>, PipelineError> {
    registry.get(name).ok_or_else(|| PipelineError::UnknownAgent {
        stage: stage.into(),
        agent: name.into(),
    })
}

/// Traversal bookkeeping for one query.
struct Trace {
    path: Vec<SupportState>,
    model_calls: usize,
}

impl Trace {
    fn enter(&mut self, state: SupportState) {
        debug!(?state, "Support state");
        self.path.push(state);
    }

    fn finish(self, answer: impl Into<String>, resolution: Resolution) -> SupportReply {
        SupportReply {
            answer: answer.into(),
            resolution,
            path: self.path,
            model_calls: self.model_calls,
        }
    }
}

impl SupportAssistant {
    pub fn new(registry: Arc<AgentRegistry>, knowledge: KnowledgeBase) -> Result<Self, PipelineError> {
        Ok(Self {
            inquiry: agent(&registry, "inquiry", INQUIRY)?,
            returns: agent(&registry, "returns", RETURNS)?,
            escalation: agent(&registry, "escalation", ESCALATION)?,
            knowledge,
        })
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Answer one customer query.
    pub async fn handle(&self, client: &CompletionClient, query: &str) -> Result<SupportReply, Error> {
        if query.trim().is_empty() {
            return Err(ValidationError::MissingField("query").into());
        }

        let started = Instant::now();
        let mut trace = Trace {
            path: Vec::with_capacity(4),
            model_calls: 0,
        };
        let result = self.traverse(client, query, &mut trace).await;

        let success = result.is_ok();
        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            states = trace.path.len(),
            model_calls = trace.model_calls,
            success,
            duration_ms,
            "Support query handled"
        );
        client.publish(DomainEvent::PipelineFinished {
            pipeline: "support".into(),
            stages_run: trace.model_calls,
            success,
            duration_ms,
            timestamp: Utc::now(),
        });

        let (answer, resolution) = result?;
        Ok(trace.finish(answer, resolution))
    }

    async fn traverse(
        &self,
        client: &CompletionClient,
        query: &str,
        trace: &mut Trace,
    ) -> Result<(String, Resolution), Error> {
        trace.enter(SupportState::FaqDirect);
        if let Some(answer) = self.knowledge.faq_answer(query) {
            return Ok((answer.to_string(), Resolution::Faq));
        }

        trace.enter(SupportState::Inquiry);
        let mut current = self.call(client, "inquiry", &self.inquiry, query, trace).await?;

        match routing::inspect(&current) {
            RouteDecision::FaqLookup(faq_query) => {
                debug!(query = %faq_query, "Inquiry asked for an FAQ lookup");
                return Ok((
                    self.knowledge.search_faq(&faq_query).to_string(),
                    Resolution::Faq,
                ));
            }
            RouteDecision::Escalate(EscalationTarget::Returns) => {
                trace.enter(SupportState::Returns);
                if let Some(answer) = self.knowledge.return_policy_answer(query) {
                    return Ok((answer.to_string(), Resolution::ReturnPolicy));
                }
                current = self.call(client, "returns", &self.returns, query, trace).await?;
            }
            RouteDecision::Escalate(EscalationTarget::Human) | RouteDecision::NoAction => {}
        }

        if routing::contains_marker(&current, Marker::EscalateToHuman) {
            trace.enter(SupportState::Escalation);
            current = self
                .call(client, "escalation", &self.escalation, query, trace)
                .await?;
        }

        Ok((current, Resolution::Agent))
    }

    async fn call(
        &self,
        client: &CompletionClient,
        stage: &str,
        agent: &AgentDefinition,
        query: &str,
        trace: &mut Trace,
    ) -> Result<String, Error> {
        trace.model_calls += 1;
        client.ask(agent, query).await.map_err(|source| Error::Stage {
            stage: stage.to_string(),
            source,
        })
    }
}
