//! Step and pipeline result types

use crate::core::context::MemoryMessage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Normalized result of one step execution
///
/// Step executors can produce loosely shaped values (a mapping with
/// `content`/`artifacts`/`citations`, a bare string, anything else); the
/// coordinator normalizes every result into this one type at the boundary so
/// aggregation never branches on runtime shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepOutput {
    /// The step's primary result content
    pub content: Value,

    /// Artifacts produced by the step (files, documents, renders)
    #[serde(default)]
    pub artifacts: Vec<Value>,

    /// Citations backing the step's content
    #[serde(default)]
    pub citations: Vec<Value>,

    /// Conversational messages to merge into the run's memory buffer
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<MemoryMessage>,
}

impl StepOutput {
    pub fn new(content: Value) -> Self {
        Self {
            content,
            artifacts: Vec::new(),
            citations: Vec::new(),
            messages: Vec::new(),
        }
    }

    pub fn with_artifacts(mut self, artifacts: Vec<Value>) -> Self {
        self.artifacts = artifacts;
        self
    }

    pub fn with_citations(mut self, citations: Vec<Value>) -> Self {
        self.citations = citations;
        self
    }

    pub fn with_messages(mut self, messages: Vec<MemoryMessage>) -> Self {
        self.messages = messages;
        self
    }

    /// Normalize an arbitrary value into a `StepOutput`
    ///
    /// A mapping with a `content` key is unpacked, pulling `artifacts` and
    /// `citations` arrays alongside it. Anything else is opaque content with
    /// no artifacts or citations. Never fails.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut map) if map.contains_key("content") => {
                let content = map.remove("content").unwrap_or(Value::Null);
                let artifacts = match map.remove("artifacts") {
                    Some(Value::Array(items)) => items,
                    _ => Vec::new(),
                };
                let citations = match map.remove("citations") {
                    Some(Value::Array(items)) => items,
                    _ => Vec::new(),
                };
                let messages = map
                    .remove("messages")
                    .and_then(|v| serde_json::from_value(v).ok())
                    .unwrap_or_default();
                Self {
                    content,
                    artifacts,
                    citations,
                    messages,
                }
            }
            other => Self::new(other),
        }
    }
}

/// Record of one step execution attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepExecution {
    /// Which step was executed
    pub agent_id: String,

    /// Which workflow the step delegated to
    pub workflow_name: String,

    /// Whether the attempt succeeded
    pub success: bool,

    /// Normalized step output (empty on failure)
    pub output: StepOutput,

    /// Failure description, when the attempt failed
    pub error: Option<String>,

    /// Wall-clock duration of the attempt in milliseconds
    pub duration_ms: u64,
}

impl StepExecution {
    /// Record a successful attempt
    pub fn succeeded(
        agent_id: impl Into<String>,
        workflow_name: impl Into<String>,
        output: StepOutput,
        duration_ms: u64,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            workflow_name: workflow_name.into(),
            success: true,
            output,
            error: None,
            duration_ms,
        }
    }

    /// Record a failed attempt
    pub fn failed(
        agent_id: impl Into<String>,
        workflow_name: impl Into<String>,
        error: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            workflow_name: workflow_name.into(),
            success: false,
            output: StepOutput::default(),
            error: Some(error.into()),
            duration_ms,
        }
    }
}

/// Overall outcome of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    /// Every step succeeded
    Success,
    /// At least one step succeeded and at least one failed
    PartialFailure,
    /// No step succeeded
    Failure,
}

impl PipelineStatus {
    /// Derive the overall status from the execution records
    pub fn from_records(records: &[StepExecution]) -> Self {
        let succeeded = records.iter().filter(|r| r.success).count();
        if succeeded == records.len() {
            PipelineStatus::Success
        } else if succeeded > 0 {
            PipelineStatus::PartialFailure
        } else {
            PipelineStatus::Failure
        }
    }
}

/// Result of one pipeline run, returned by the coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    /// The run's unique id
    pub pipeline_id: Uuid,

    /// Overall outcome
    pub status: PipelineStatus,

    /// Per-step execution records in causal completion order
    pub execution_results: Vec<StepExecution>,

    /// Aggregated final result
    pub final_result: Value,
}
