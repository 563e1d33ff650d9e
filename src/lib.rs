//! agentflow - multi-agent pipeline orchestration engine
//!
//! Runs declarative pipelines of agent steps in sequential, parallel, or
//! conditional order, threading a shared memory context between steps and
//! aggregating per-step results into one final result.

pub mod core;
pub mod execution;

// Re-export commonly used types
pub use core::{
    AgentStep, AgentTransition, ConfigError, MemoryMessage, OutputAggregation, PipelineConfig,
    PipelineResult, PipelineStatus, SharedMemoryContext, StepExecution, StepOutput,
};
pub use execution::{
    ExecutorError, ExecutorRegistry, MultiAgentCoordinator, PipelineEvent, StepExecutor,
};
