//! Pipeline execution engine

pub mod aggregate;
pub mod coordinator;
pub mod executor;
pub mod registry;

pub use aggregate::aggregate;
pub use coordinator::{EventHandler, MultiAgentCoordinator, PipelineEvent};
pub use executor::{ExecutorError, StepExecutor};
pub use registry::ExecutorRegistry;
