//! News digest: search, filter, then summarize.

use std::sync::Arc;

use relaydesk_core::agent::AgentRegistry;
use relaydesk_core::error::{Error, PipelineError, ValidationError};
use serde::{Deserialize, Serialize};

use crate::client::CompletionClient;
use crate::pipeline::{LinearPipeline, PipelineStage};

pub const SEARCH: &str = "Search Agent";
pub const FILTER: &str = "Filter Agent";
pub const DIGEST: &str = "Digest Agent";

/// All three stage outputs; `digest` is what users read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsDigest {
    pub topic: String,
    pub articles: String,
    pub filtered: String,
    pub digest: String,
}

pub struct NewsDigestAssistant {
    pipeline: LinearPipeline,
}

impl NewsDigestAssistant {
    pub fn new(registry: Arc<AgentRegistry>) -> Result<Self, PipelineError> {
        let pipeline = LinearPipeline::builder("news_digest", registry)
            .stage(PipelineStage::new("search", SEARCH))
            .stage(PipelineStage::after("filter", FILTER, "search"))
            .stage(PipelineStage::after("digest", DIGEST, "filter"))
            .build()?;
        Ok(Self { pipeline })
    }

    pub async fn digest(&self, client: &CompletionClient, topic: &str) -> Result<NewsDigest, Error> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ValidationError::MissingField("topic").into());
        }

        let mut output = self.pipeline.run(client, topic).await?;
        Ok(NewsDigest {
            topic: topic.to_string(),
            articles: output.take("search"),
            filtered: output.take("filter"),
            digest: output.take("digest"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistants::default_registry;
    use crate::test_helpers::ScriptedProvider;
    use relaydesk_core::error::ProviderError;

    #[tokio::test]
    async fn each_stage_reads_the_previous_one() {
        let registry = Arc::new(default_registry().unwrap());
        let provider = Arc::new(
            ScriptedProvider::new(&registry)
                .reply(SEARCH, r#"[{"title":"A"},{"title":"B"}]"#)
                .reply_with(FILTER, |articles| articles.replace(r#",{"title":"B"}"#, ""))
                .reply_with(DIGEST, |filtered| format!("- digest of {filtered}")),
        );
        let client = CompletionClient::new(provider.clone(), "mock-model");
        let assistant = NewsDigestAssistant::new(registry).unwrap();

        let digest = assistant.digest(&client, "  AI ").await.unwrap();

        assert_eq!(digest.topic, "AI");
        assert_eq!(digest.filtered, r#"[{"title":"A"}]"#);
        assert_eq!(digest.digest, r#"- digest of [{"title":"A"}]"#);
        let calls = provider.calls();
        assert_eq!(calls[0].input, "AI");
        assert_eq!(calls[1].input, digest.articles);
        assert_eq!(provider.agents_called(), vec![SEARCH, FILTER, DIGEST]);
    }

    #[tokio::test]
    async fn blank_topic_rejected() {
        let registry = Arc::new(default_registry().unwrap());
        let provider = Arc::new(ScriptedProvider::new(&registry));
        let client = CompletionClient::new(provider.clone(), "mock-model");
        let assistant = NewsDigestAssistant::new(registry).unwrap();

        let err = assistant.digest(&client, "   ").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn failed_filter_stops_before_digest() {
        let registry = Arc::new(default_registry().unwrap());
        let provider = Arc::new(
            ScriptedProvider::new(&registry)
                .reply(SEARCH, "[]")
                .fail(FILTER, ProviderError::RateLimited { retry_after_secs: 5 }),
        );
        let client = CompletionClient::new(provider.clone(), "mock-model");
        let assistant = NewsDigestAssistant::new(registry).unwrap();

        let err = assistant.digest(&client, "sports").await.unwrap_err();
        assert!(matches!(err, Error::Stage { ref stage, .. } if stage == "filter"));
        assert_eq!(provider.agents_called(), vec![SEARCH, FILTER]);
    }
}
