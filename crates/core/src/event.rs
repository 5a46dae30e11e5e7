//! Domain event system: decoupled observation of pipeline activity.
//!
//! The completion client and the pipelines publish events; the gateway and
//! tests subscribe to see which agents ran, in which order, and how long
//! they took.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A completion call was issued on behalf of an agent
    AgentInvoked {
        agent: String,
        timestamp: DateTime<Utc>,
    },

    /// A completion call returned text
    AgentCompleted {
        agent: String,
        output_chars: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A completion call failed
    AgentFailed {
        agent: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// A pipeline run finished, successfully or not
    PipelineFinished {
        pipeline: String,
        stages_run: usize,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// The agent this event is about, if any.
    pub fn agent(&self) -> Option<&str> {
        match self {
            DomainEvent::AgentInvoked { agent, .. }
            | DomainEvent::AgentCompleted { agent, .. }
            | DomainEvent::AgentFailed { agent, .. } => Some(agent),
            DomainEvent::PipelineFinished { .. } => None,
        }
    }
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
