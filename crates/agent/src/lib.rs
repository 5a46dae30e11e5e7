//! Multi-agent orchestration for RelayDesk.
//!
//! Every assistant follows the same shape:
//!
//! 1. **Validate** the user's input (before any model call)
//! 2. **Run stages** in order, each one agent call via the [`CompletionClient`]
//! 3. **Route** model output where the flow branches (support only)
//! 4. **Return** every stage's text to the caller
//!
//! Agents are registry data; pipelines name them and are checked against the
//! registry when built.

pub mod assistants;
pub mod client;
pub mod document;
pub mod pipeline;
pub mod routing;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use assistants::{
    Assistants, CodeReview, CodeReviewAssistant, KnowledgeBase, NewsDigest, NewsDigestAssistant,
    Resolution, StudyAssistant, StudyPlan, StudyRequest, StudySource, SupportAssistant,
    SupportReply, SupportState, TravelAssistant, TravelType, TripPlan, TripRequest,
    default_registry,
};
pub use client::CompletionClient;
pub use document::{DocumentFormat, extract_text};
pub use pipeline::{LinearPipeline, PipelineOutput, PipelineStage, StageContext, StageOutput};
pub use routing::{ResourceLink, RouteDecision};
pub use session::{QnaPair, SessionContext, SessionId, SessionStore};
