//! Agent definitions and the registry that owns them.
//!
//! An agent is configuration, not behavior: a unique name plus the static
//! system instructions sent with every call made on its behalf.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::RegistryError;

/// An immutable named role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDefinition {
    name: String,
    instructions: String,
}

impl AgentDefinition {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }
}

/// Read-only mapping from agent name to definition.
///
/// Built once at startup and shared through `Arc`; registration order is
/// kept so listings are stable.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: Vec<Arc<AgentDefinition>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent. Names must be unique.
    pub fn register(&mut self, agent: AgentDefinition) -> Result<(), RegistryError> {
        if self.contains(agent.name()) {
            return Err(RegistryError::DuplicateAgent(agent.name.clone()));
        }
        self.agents.push(Arc::new(agent));
        Ok(())
    }

    /// Builder-style registration.
    pub fn with(mut self, agent: AgentDefinition) -> Result<Self, RegistryError> {
        self.register(agent)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<Arc<AgentDefinition>> {
        self.agents.iter().find(|a| a.name() == name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.agents.iter().any(|a| a.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentDefinition> {
        self.agents.iter().map(|a| a.as_ref())
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
