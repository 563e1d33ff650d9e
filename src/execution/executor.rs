//! Step executor contract

use crate::core::{AgentStep, SharedMemoryContext, StepOutput};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Error types for step executor operations
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("execution failed: {0}")]
    Execution(String),

    #[error("timeout after {0} seconds")]
    Timeout(u64),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Trait for executing a single agent step - allows for different
/// implementations (LLM workflows, retrieval steps, renderers, test mocks)
///
/// Implementations receive the shared context read-only; results flow back
/// through the return value and the coordinator writes them into the context.
/// Failure is an `Err` with a descriptive message; the coordinator converts
/// it into a failed execution record rather than propagating it.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    /// Execute a step against the given input
    async fn execute(
        &self,
        step: &AgentStep,
        input: &Value,
        context: &SharedMemoryContext,
    ) -> Result<StepOutput, ExecutorError>;
}
