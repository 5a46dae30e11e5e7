//! The completion client: runs one agent against one message history.
//!
//! Every stage of every pipeline goes through [`CompletionClient::run`]. The
//! client attaches the agent's instructions as the system prompt, enforces
//! the per-call deadline, and publishes agent events. It never retries.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use relaydesk_config::AppConfig;
use relaydesk_core::agent::AgentDefinition;
use relaydesk_core::error::ProviderError;
use relaydesk_core::event::{DomainEvent, EventBus};
use relaydesk_core::message::Message;
use relaydesk_core::provider::{Provider, ProviderRequest};
use tracing::{debug, warn};

pub struct CompletionClient {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Option<Duration>,
    event_bus: Option<Arc<EventBus>>,
}

impl CompletionClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            timeout: None,
            event_bus: None,
        }
    }

    /// Build the client from configuration.
    ///
    /// Fails with [`ProviderError::InvalidCredential`] when no API key is
    /// configured, so callers can refuse to start.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let provider = relaydesk_providers::build_from_config(config)?;
        let client = Self::new(provider, &config.default_model)
            .with_temperature(config.default_temperature)
            .with_timeout(Duration::from_secs(config.request_timeout_secs));
        Ok(match config.default_max_tokens {
            Some(max_tokens) => client.with_max_tokens(max_tokens),
            None => client,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn event_bus(&self) -> Option<&Arc<EventBus>> {
        self.event_bus.as_ref()
    }

    pub(crate) fn publish(&self, event: DomainEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }

    /// Run `agent` over `history` and return the generated text verbatim.
    pub async fn run(
        &self,
        agent: &AgentDefinition,
        history: &[Message],
    ) -> Result<String, ProviderError> {
        if history.is_empty() {
            return Err(ProviderError::InvalidRequest(format!(
                "agent '{}' was called with an empty message history",
                agent.name()
            )));
        }

        let request = ProviderRequest {
            model: self.model.clone(),
            system: Some(agent.instructions().to_string()),
            messages: history.to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(
            agent = agent.name(),
            provider = self.provider.name(),
            model = %self.model,
            "Running agent"
        );
        self.publish(DomainEvent::AgentInvoked {
            agent: agent.name().to_string(),
            timestamp: Utc::now(),
        });

        let started = Instant::now();
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.provider.complete(request))
                .await
                .unwrap_or_else(|_| {
                    Err(ProviderError::Timeout {
                        agent: agent.name().to_string(),
                        timeout_secs: limit.as_secs(),
                    })
                }),
            None => self.provider.complete(request).await,
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(response) => {
                let text = response.message.content;
                debug!(
                    agent = agent.name(),
                    duration_ms,
                    chars = text.len(),
                    tokens = response.usage.as_ref().map(|u| u.total_tokens),
                    "Agent finished"
                );
                self.publish(DomainEvent::AgentCompleted {
                    agent: agent.name().to_string(),
                    output_chars: text.chars().count(),
                    duration_ms,
                    timestamp: Utc::now(),
                });
                Ok(text)
            }
            Err(e) => {
                warn!(agent = agent.name(), duration_ms, error = %e, "Agent call failed");
                self.publish(DomainEvent::AgentFailed {
                    agent: agent.name().to_string(),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
                Err(e)
            }
        }
    }

    /// Run `agent` on a single user message.
    pub async fn ask(
        &self,
        agent: &AgentDefinition,
        content: impl Into<String>,
    ) -> Result<String, ProviderError> {
        self.run(agent, &[Message::user(content)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedProvider;
    use relaydesk_core::agent::AgentRegistry;

    fn registry() -> AgentRegistry {
        AgentRegistry::new()
            .with(AgentDefinition::new("Echo", "Repeat the input."))
            .unwrap()
    }

    #[tokio::test]
    async fn returns_provider_text_verbatim() {
        let registry = registry();
        let provider = Arc::new(ScriptedProvider::new(&registry).reply("Echo", "  exact text\n"));
        let client = CompletionClient::new(provider.clone(), "mock-model");

        let agent = registry.get("Echo").unwrap();
        let out = client.ask(&agent, "hello").await.unwrap();
        assert_eq!(out, "  exact text\n");

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].agent, "Echo");
        assert_eq!(calls[0].input, "hello");
    }

    #[tokio::test]
    async fn instructions_travel_as_system_prompt() {
        let registry = registry();
        let provider = Arc::new(ScriptedProvider::new(&registry).reply("Echo", "ok"));
        let client = CompletionClient::new(provider.clone(), "mock-model").with_temperature(0.1);

        client
            .ask(&registry.get("Echo").unwrap(), "hi")
            .await
            .unwrap();

        let request = provider.last_request().unwrap();
        assert_eq!(request.system.as_deref(), Some("Repeat the input."));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.model, "mock-model");
        assert!((request.temperature - 0.1).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn empty_history_rejected_without_calling_provider() {
        let registry = registry();
        let provider = Arc::new(ScriptedProvider::new(&registry).reply("Echo", "ok"));
        let client = CompletionClient::new(provider.clone(), "mock-model");

        let err = client
            .run(&registry.get("Echo").unwrap(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn provider_errors_propagate_unchanged() {
        let registry = registry();
        let provider = Arc::new(
            ScriptedProvider::new(&registry)
                .fail("Echo", ProviderError::Network("connection refused".into())),
        );
        let client = CompletionClient::new(provider, "mock-model");

        let err = client
            .ask(&registry.get("Echo").unwrap(), "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let registry = registry();
        let provider = Arc::new(
            ScriptedProvider::new(&registry)
                .reply("Echo", "late")
                .with_delay(Duration::from_secs(60)),
        );
        let client =
            CompletionClient::new(provider, "mock-model").with_timeout(Duration::from_secs(5));

        let err = client
            .ask(&registry.get("Echo").unwrap(), "hi")
            .await
            .unwrap_err();
        match err {
            ProviderError::Timeout {
                agent,
                timeout_secs,
            } => {
                assert_eq!(agent, "Echo");
                assert_eq!(timeout_secs, 5);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn publishes_invoked_then_completed() {
        let registry = registry();
        let provider = Arc::new(ScriptedProvider::new(&registry).reply("Echo", "done"));
        let bus = Arc::new(EventBus::new(16));
        let mut rx = bus.subscribe();
        let client = CompletionClient::new(provider, "mock-model").with_event_bus(bus);

        client
            .ask(&registry.get("Echo").unwrap(), "hi")
            .await
            .unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(matches!(first.as_ref(), DomainEvent::AgentInvoked { .. }));
        assert!(matches!(
            second.as_ref(),
            DomainEvent::AgentCompleted { output_chars: 4, .. }
        ));
    }

    #[test]
    fn from_config_requires_api_key() {
        let err = CompletionClient::from_config(&AppConfig::default()).err().unwrap();
        assert!(matches!(err, ProviderError::InvalidCredential(_)));

        let config = AppConfig {
            api_key: Some("key".into()),
            default_max_tokens: Some(512),
            ..AppConfig::default()
        };
        let client = CompletionClient::from_config(&config).unwrap();
        assert_eq!(client.model(), "gemini-2.0-flash");
        assert_eq!(client.provider_name(), "gemini");
        assert_eq!(client.max_tokens, Some(512));
    }
}
