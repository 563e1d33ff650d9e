//! Pipeline configuration and validation

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// A single agent step in a pipeline
///
/// Immutable once a pipeline run starts. The `workflow_name` is the lookup
/// key used against the executor registry; `conditional_next` is only
/// consulted under the `Conditional` transition type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentStep {
    /// Unique step identifier within the pipeline
    pub agent_id: String,

    /// Registry lookup key for the executor that runs this step
    pub workflow_name: String,

    /// Step to route to after this one completes (conditional transitions)
    #[serde(default)]
    pub conditional_next: Option<String>,
}

impl AgentStep {
    pub fn new(agent_id: impl Into<String>, workflow_name: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            workflow_name: workflow_name.into(),
            conditional_next: None,
        }
    }

    pub fn with_next(mut self, next: impl Into<String>) -> Self {
        self.conditional_next = Some(next.into());
        self
    }

    /// Routing target, treating an empty string as unset
    pub fn next_target(&self) -> Option<&str> {
        self.conditional_next
            .as_deref()
            .filter(|next| !next.is_empty())
    }
}

/// How agent steps are scheduled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentTransition {
    /// Steps run strictly in list order, one at a time
    #[default]
    Sequential,
    /// All steps launched concurrently against the same input, joined before
    /// aggregation
    Parallel,
    /// Execution follows each step's `conditional_next` edge, falling back to
    /// list order
    Conditional,
}

/// How the final result is derived from the execution records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputAggregation {
    /// Final result is the last successful step's content
    #[default]
    LastStep,
    /// Final result carries all execution records plus a shared-variable
    /// snapshot
    AllSteps,
}

/// Configuration errors detected before any step runs
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("pipeline name must not be empty")]
    EmptyName,

    #[error("pipeline '{0}' has no steps")]
    NoSteps(String),

    #[error("duplicate agent_id: {0}")]
    DuplicateAgentId(String),

    #[error("step '{agent_id}' routes to unknown step '{target}'")]
    DanglingNext { agent_id: String, target: String },

    #[error("step '{0}' routes to itself")]
    SelfNext(String),
}

/// Declarative pipeline configuration
///
/// Constructed by the configuration source (YAML or directly in code) and
/// read-only for the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name
    pub pipeline_name: String,

    /// Ordered list of agent steps
    pub agent_steps: Vec<AgentStep>,

    /// Scheduling discipline
    #[serde(default)]
    pub transition_type: AgentTransition,

    /// Final-result aggregation policy
    #[serde(default)]
    pub output_aggregation: OutputAggregation,

    /// Per-step timeout budget in seconds (no timeout when unset)
    #[serde(default)]
    pub default_timeout_secs: Option<u64>,
}

impl PipelineConfig {
    pub fn new(pipeline_name: impl Into<String>, agent_steps: Vec<AgentStep>) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            agent_steps,
            transition_type: AgentTransition::default(),
            output_aggregation: OutputAggregation::default(),
            default_timeout_secs: None,
        }
    }

    pub fn with_transition(mut self, transition: AgentTransition) -> Self {
        self.transition_type = transition;
        self
    }

    pub fn with_aggregation(mut self, aggregation: OutputAggregation) -> Self {
        self.output_aggregation = aggregation;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.default_timeout_secs = Some(secs);
        self
    }

    /// Load pipeline configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse pipeline configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// An invalid config is a normal error return, never a panic; the
    /// coordinator refuses to execute configs failing any rule here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline_name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }

        if self.agent_steps.is_empty() {
            return Err(ConfigError::NoSteps(self.pipeline_name.clone()));
        }

        let mut seen_ids = HashSet::new();
        for step in &self.agent_steps {
            if !seen_ids.insert(step.agent_id.as_str()) {
                return Err(ConfigError::DuplicateAgentId(step.agent_id.clone()));
            }
        }

        for step in &self.agent_steps {
            if let Some(target) = step.next_target() {
                // A route must point at some *other* step
                if target == step.agent_id {
                    return Err(ConfigError::SelfNext(step.agent_id.clone()));
                }
                if !seen_ids.contains(target) {
                    return Err(ConfigError::DanglingNext {
                        agent_id: step.agent_id.clone(),
                        target: target.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Look up a step by id
    pub fn step(&self, agent_id: &str) -> Option<&AgentStep> {
        self.agent_steps.iter().find(|s| s.agent_id == agent_id)
    }

    /// Position of a step in the configured list order
    pub fn step_index(&self, agent_id: &str) -> Option<usize> {
        self.agent_steps.iter().position(|s| s.agent_id == agent_id)
    }
}
