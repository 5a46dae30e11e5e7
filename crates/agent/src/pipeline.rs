//! Linear multi-agent pipelines.
//!
//! A pipeline is an ordered list of stages. Each stage names an agent from
//! the registry and builds that agent's single user message from the
//! original input and the outputs of earlier stages.
//!
//! ```text
//! input ──▶ analysis ──▶ suggestions
//!   └─────▶ documentation
//! ```
//!
//! Stages run one after another in declared order. A stage may only read
//! the outputs of stages declared before it; [`PipelineBuilder::build`]
//! rejects anything else.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use relaydesk_core::agent::AgentRegistry;
use relaydesk_core::error::{Error, PipelineError, ProviderError};
use relaydesk_core::event::DomainEvent;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::client::CompletionClient;

type InputFn = Arc<dyn Fn(&StageContext<'_>) -> String + Send + Sync>;

/// What a stage can see when it builds its input.
pub struct StageContext<'a> {
    input: &'a str,
    outputs: &'a [StageOutput],
}

impl<'a> StageContext<'a> {
    /// The text the pipeline was started with.
    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Output of an earlier stage. Empty when the key is unknown, which
    /// `build` rules out for declared dependencies.
    pub fn output(&self, key: &str) -> &'a str {
        self.outputs
            .iter()
            .find(|o| o.key == key)
            .map(|o| o.text.as_str())
            .unwrap_or_default()
    }
}

/// One step of a pipeline.
#[derive(Clone)]
pub struct PipelineStage {
    key: String,
    agent: String,
    depends_on: Vec<String>,
    input: InputFn,
}

impl PipelineStage {
    /// A stage fed with the pipeline input.
    pub fn new(key: impl Into<String>, agent: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            agent: agent.into(),
            depends_on: Vec::new(),
            input: Arc::new(|ctx: &StageContext<'_>| ctx.input().to_string()),
        }
    }

    /// A stage fed with the output of `dependency`.
    pub fn after(
        key: impl Into<String>,
        agent: impl Into<String>,
        dependency: impl Into<String>,
    ) -> Self {
        let dependency = dependency.into();
        let source = dependency.clone();
        Self::new(key, agent)
            .depends_on(dependency)
            .with_input(move |ctx| ctx.output(&source).to_string())
    }

    pub fn depends_on(mut self, key: impl Into<String>) -> Self {
        self.depends_on.push(key.into());
        self
    }

    /// Replace how the stage builds its message.
    pub fn with_input(
        mut self,
        input: impl Fn(&StageContext<'_>) -> String + Send + Sync + 'static,
    ) -> Self {
        self.input = Arc::new(input);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }
}

impl fmt::Debug for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineStage")
            .field("key", &self.key)
            .field("agent", &self.agent)
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}

/// The text one stage produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutput {
    pub key: String,
    pub agent: String,
    pub text: String,
}

/// Every stage output of one run, in execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub pipeline: String,
    pub stages: Vec<StageOutput>,
}

impl PipelineOutput {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.stages
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.text.as_str())
    }

    /// Move a stage's text out, leaving an empty string behind.
    pub fn take(&mut self, key: &str) -> String {
        self.stages
            .iter_mut()
            .find(|s| s.key == key)
            .map(|s| std::mem::take(&mut s.text))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// A validated, immutable chain of stages.
#[derive(Debug, Clone)]
pub struct LinearPipeline {
    name: String,
    registry: Arc<AgentRegistry>,
    stages: Vec<PipelineStage>,
}

pub struct PipelineBuilder {
    name: String,
    registry: Arc<AgentRegistry>,
    stages: Vec<PipelineStage>,
}

impl PipelineBuilder {
    pub fn stage(mut self, stage: PipelineStage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Check the stage graph against the registry.
    pub fn build(self) -> Result<LinearPipeline, PipelineError> {
        if self.stages.is_empty() {
            return Err(PipelineError::Empty(self.name));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for stage in &self.stages {
            if !self.registry.contains(&stage.agent) {
                return Err(PipelineError::UnknownAgent {
                    stage: stage.key.clone(),
                    agent: stage.agent.clone(),
                });
            }
            if let Some(dependency) = stage
                .depends_on
                .iter()
                .find(|d| !seen.contains(d.as_str()))
            {
                return Err(PipelineError::UnresolvedDependency {
                    stage: stage.key.clone(),
                    dependency: dependency.clone(),
                });
            }
            if !seen.insert(&stage.key) {
                return Err(PipelineError::DuplicateStage(stage.key.clone()));
            }
        }

        Ok(LinearPipeline {
            name: self.name,
            registry: self.registry,
            stages: self.stages,
        })
    }
}

impl LinearPipeline {
    pub fn builder(name: impl Into<String>, registry: Arc<AgentRegistry>) -> PipelineBuilder {
        PipelineBuilder {
            name: name.into(),
            registry,
            stages: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    /// Run every stage in order.
    ///
    /// The first failing stage aborts the run; later stages are not called.
    pub async fn run(
        &self,
        client: &CompletionClient,
        input: &str,
    ) -> Result<PipelineOutput, Error> {
        let started = Instant::now();
        let mut outputs: Vec<StageOutput> = Vec::with_capacity(self.stages.len());

        info!(pipeline = %self.name, stages = self.stages.len(), "Running pipeline");

        for stage in &self.stages {
            let result = self.run_stage(client, stage, input, &outputs).await;
            match result {
                Ok(text) => outputs.push(StageOutput {
                    key: stage.key.clone(),
                    agent: stage.agent.clone(),
                    text,
                }),
                Err(source) => {
                    warn!(pipeline = %self.name, stage = %stage.key, error = %source, "Stage failed");
                    self.finish(client, outputs.len(), false, started);
                    return Err(Error::Stage {
                        stage: stage.key.clone(),
                        source,
                    });
                }
            }
        }

        self.finish(client, outputs.len(), true, started);
        Ok(PipelineOutput {
            pipeline: self.name.clone(),
            stages: outputs,
        })
    }

    async fn run_stage(
        &self,
        client: &CompletionClient,
        stage: &PipelineStage,
        input: &str,
        outputs: &[StageOutput],
    ) -> Result<String, ProviderError> {
        // Agents are checked in build(); the registry is never mutated after.
        let agent = self.registry.get(&stage.agent).ok_or_else(|| {
            ProviderError::InvalidRequest(format!(
                "agent '{}' is not registered",
                stage.agent
            ))
        })?;
        let message = (stage.input)(&StageContext { input, outputs });
        debug!(pipeline = %self.name, stage = %stage.key, agent = %stage.agent, "Stage start");
        client.ask(&agent, message).await
    }

    fn finish(&self, client: &CompletionClient, stages_run: usize, success: bool, started: Instant) {
        let duration_ms = started.elapsed().as_millis() as u64;
        info!(pipeline = %self.name, stages_run, success, duration_ms, "Pipeline finished");
        client.publish(DomainEvent::PipelineFinished {
            pipeline: self.name.clone(),
            stages_run,
            success,
            duration_ms,
            timestamp: Utc::now(),
        });
    }
}
