//! Shared test helpers for client, pipeline and assistant tests.

use relaydesk_core::agent::AgentRegistry;
use relaydesk_core::error::ProviderError;
use relaydesk_core::message::Message;
use relaydesk_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Reply = Arc<dyn Fn(&str) -> Result<String, ProviderError> + Send + Sync>;

/// One completion call as the provider saw it.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub agent: String,
    pub input: String,
}

/// A mock provider that answers per agent.
///
/// Requests are attributed to agents by their system prompt, so the
/// provider is built from the same registry the pipeline uses. A call for
/// an agent without a scripted reply panics.
pub struct ScriptedProvider {
    agents_by_instructions: HashMap<String, String>,
    replies: HashMap<String, Reply>,
    delay: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(registry: &AgentRegistry) -> Self {
        Self {
            agents_by_instructions: registry
                .iter()
                .map(|a| (a.instructions().to_string(), a.name().to_string()))
                .collect(),
            replies: HashMap::new(),
            delay: None,
            calls: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer `agent` with `text`.
    pub fn reply(self, agent: &str, text: &str) -> Self {
        let text = text.to_string();
        self.reply_with(agent, move |_| text.clone())
    }

    /// Answer `agent` with a function of its input.
    pub fn reply_with(
        mut self,
        agent: &str,
        f: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.replies
            .insert(agent.to_string(), Arc::new(move |input: &str| Ok(f(input))));
        self
    }

    /// Make every call for `agent` fail with `error`.
    pub fn fail(mut self, agent: &str, error: ProviderError) -> Self {
        self.replies
            .insert(agent.to_string(), Arc::new(move |_: &str| Err(error.clone())));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Agent names in call order.
    pub fn agents_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.agent).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let agent = request
            .system
            .as_ref()
            .and_then(|s| self.agents_by_instructions.get(s))
            .cloned()
            .unwrap_or_else(|| panic!("ScriptedProvider: request for an unregistered agent"));
        let input = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        self.calls.lock().unwrap().push(RecordedCall {
            agent: agent.clone(),
            input: input.clone(),
        });
        self.requests.lock().unwrap().push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .replies
            .get(&agent)
            .unwrap_or_else(|| panic!("ScriptedProvider: no reply scripted for '{agent}'"));
        let text = reply(&input)?;

        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock-model".into(),
        })
    }
}
