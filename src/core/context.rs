//! Shared memory context - per-run mutable state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// A step result stored in the shared context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredStepResult {
    /// The step's result content
    pub result: Value,

    /// Whether the step succeeded
    pub success: bool,

    /// When the result was recorded
    pub timestamp: DateTime<Utc>,
}

/// One entry in the chronological execution log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Which step the entry concerns
    pub agent_id: String,

    /// What happened
    pub message: String,

    /// When the entry was recorded
    pub timestamp: DateTime<Utc>,
}

/// A message in the conversational memory buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMessage {
    /// Message role (e.g. "user", "assistant")
    pub role: String,

    /// Message content
    pub content: String,
}

impl MemoryMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Mutable state shared across steps within one pipeline run
///
/// Created fresh at the start of `execute_pipeline` and owned exclusively by
/// that run. Step executors never mutate it directly; they return results
/// which the coordinator writes on their behalf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedMemoryContext {
    /// Unique id for this pipeline run
    pipeline_id: Uuid,

    /// Arbitrary key/value state shared across steps
    shared_variables: HashMap<String, Value>,

    /// Results keyed by agent_id; the first write per key wins
    step_results: HashMap<String, StoredStepResult>,

    /// Chronological record of what the coordinator did, in causal order
    execution_log: Vec<LogEntry>,

    /// Conversational memory merged from message lists supplied by steps
    memory: Vec<MemoryMessage>,
}

impl SharedMemoryContext {
    /// Create a fresh context with a generated pipeline id
    pub fn new() -> Self {
        Self {
            pipeline_id: Uuid::new_v4(),
            shared_variables: HashMap::new(),
            step_results: HashMap::new(),
            execution_log: Vec::new(),
            memory: Vec::new(),
        }
    }

    pub fn pipeline_id(&self) -> Uuid {
        self.pipeline_id
    }

    /// Set a shared variable
    pub fn set_shared_variable(&mut self, key: impl Into<String>, value: Value) {
        self.shared_variables.insert(key.into(), value);
    }

    /// Get a shared variable
    pub fn get_shared_variable(&self, key: &str) -> Option<&Value> {
        self.shared_variables.get(key)
    }

    /// Get a shared variable, falling back to a default
    pub fn get_shared_variable_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.shared_variables.get(key).unwrap_or(default)
    }

    /// Snapshot of all shared variables
    pub fn shared_variables(&self) -> &HashMap<String, Value> {
        &self.shared_variables
    }

    /// Record a step result keyed by agent_id
    ///
    /// Append-only per key: once a step id has a result, later writes within
    /// the same run are ignored.
    pub fn add_step_result(&mut self, agent_id: impl Into<String>, result: Value, success: bool) {
        let agent_id = agent_id.into();
        self.step_results
            .entry(agent_id)
            .or_insert_with(|| StoredStepResult {
                result,
                success,
                timestamp: Utc::now(),
            });
    }

    /// Get a previously recorded step result
    pub fn get_step_result(&self, agent_id: &str) -> Option<&StoredStepResult> {
        self.step_results.get(agent_id)
    }

    /// Number of recorded step results
    pub fn step_result_count(&self) -> usize {
        self.step_results.len()
    }

    /// Append an entry to the execution log
    pub fn log(&mut self, agent_id: impl Into<String>, message: impl Into<String>) {
        self.execution_log.push(LogEntry {
            agent_id: agent_id.into(),
            message: message.into(),
            timestamp: Utc::now(),
        });
    }

    /// The execution log in insertion (causal) order
    pub fn execution_log(&self) -> &[LogEntry] {
        &self.execution_log
    }

    /// Merge messages into the conversational memory buffer (additive)
    pub fn merge_into_memory(&mut self, messages: Vec<MemoryMessage>) {
        self.memory.extend(messages);
    }

    /// The conversational memory buffer
    pub fn memory(&self) -> &[MemoryMessage] {
        &self.memory
    }
}

impl Default for SharedMemoryContext {
    fn default() -> Self {
        Self::new()
    }
}
