//! # RelayDesk Core
//!
//! Domain types, traits, and error definitions shared by every RelayDesk
//! crate: messages, the completion [`Provider`] trait, agent definitions and
//! their registry, and the domain event bus.
//!
//! Implementations live in their respective crates, so pipelines can be
//! driven end to end against scripted providers in tests.

pub mod agent;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentDefinition, AgentRegistry};
pub use error::{
    DocumentError, Error, PipelineError, ProviderError, RegistryError, Result, ValidationError,
};
pub use event::{DomainEvent, EventBus};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
