//! Code review: analysis, suggestions for each issue, and documentation.

use std::sync::Arc;

use relaydesk_core::agent::AgentRegistry;
use relaydesk_core::error::{Error, PipelineError, ValidationError};
use serde::{Deserialize, Serialize};

use crate::client::CompletionClient;
use crate::document;
use crate::pipeline::{LinearPipeline, PipelineStage};

pub const ANALYZER: &str = "Analyzer Agent";
pub const SUGGESTION: &str = "Suggestion Agent";
pub const DOCUMENTATION: &str = "Documentation Agent";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeReview {
    pub analysis: String,
    pub suggestions: String,
    pub documentation: String,
}

pub struct CodeReviewAssistant {
    pipeline: LinearPipeline,
}

impl CodeReviewAssistant {
    pub fn new(registry: Arc<AgentRegistry>) -> Result<Self, PipelineError> {
        let pipeline = LinearPipeline::builder("code_review", registry)
            .stage(PipelineStage::new("analysis", ANALYZER))
            .stage(PipelineStage::after("suggestions", SUGGESTION, "analysis"))
            .stage(PipelineStage::new("documentation", DOCUMENTATION))
            .build()?;
        Ok(Self { pipeline })
    }

    /// Review source text.
    pub async fn review(&self, client: &CompletionClient, code: &str) -> Result<CodeReview, Error> {
        if code.trim().is_empty() {
            return Err(ValidationError::MissingField("code").into());
        }

        let mut output = self.pipeline.run(client, code).await?;
        Ok(CodeReview {
            analysis: output.take("analysis"),
            suggestions: output.take("suggestions"),
            documentation: output.take("documentation"),
        })
    }

    /// Review an uploaded file; the name decides whether it is accepted.
    pub async fn review_file(
        &self,
        client: &CompletionClient,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<CodeReview, Error> {
        let code = document::decode_code_file(filename, bytes)?;
        tracing::info!(filename, chars = code.chars().count(), "Reviewing uploaded file");
        self.review(client, &code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistants::default_registry;
    use crate::test_helpers::ScriptedProvider;
    use relaydesk_core::error::DocumentError;

    fn setup() -> (Arc<ScriptedProvider>, CompletionClient, CodeReviewAssistant) {
        let registry = Arc::new(default_registry().unwrap());
        let provider = Arc::new(
            ScriptedProvider::new(&registry)
                .reply_with(ANALYZER, |code| format!("issues in: {code}"))
                .reply_with(SUGGESTION, |issues| format!("fix <{issues}>"))
                .reply(DOCUMENTATION, "# Docs"),
        );
        let client = CompletionClient::new(provider.clone(), "mock-model");
        (provider, client, CodeReviewAssistant::new(registry).unwrap())
    }

    #[tokio::test]
    async fn suggestions_are_built_from_the_analysis() {
        let (provider, client, assistant) = setup();

        let review = assistant.review(&client, "fn main() {}").await.unwrap();

        assert_eq!(review.analysis, "issues in: fn main() {}");
        assert_eq!(review.suggestions, "fix <issues in: fn main() {}>");
        assert_eq!(review.documentation, "# Docs");
        assert_eq!(provider.agents_called(), vec![ANALYZER, SUGGESTION, DOCUMENTATION]);
        // Documentation reads the code, not the analysis.
        assert_eq!(provider.calls()[2].input, "fn main() {}");
    }

    #[tokio::test]
    async fn blank_code_rejected_before_any_call() {
        let (provider, client, assistant) = setup();
        let err = assistant.review(&client, "  \n").await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::MissingField("code"))));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn uploads_must_be_known_source_files() {
        let (provider, client, assistant) = setup();

        let err = assistant
            .review_file(&client, "readme.md", b"# hi".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Document(DocumentError::UnsupportedFormat(_))));

        let review = assistant
            .review_file(&client, "app.py", b"print(1)".to_vec())
            .await
            .unwrap();
        assert_eq!(review.analysis, "issues in: print(1)");
        assert_eq!(provider.call_count(), 3);
    }
}
