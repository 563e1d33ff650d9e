//! Shared test executors for integration scenarios
#![allow(dead_code)]

use agentflow::{AgentStep, ExecutorError, SharedMemoryContext, StepExecutor, StepOutput};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Route scheduling logs through the test harness
///
/// Idempotent across tests in the same binary; later calls are no-ops.
pub fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

enum MockBehavior {
    /// Return the same output on every invocation
    Always(Result<StepOutput, String>),
    /// Return outputs in order; error once exhausted
    Scripted(Vec<Result<StepOutput, String>>),
}

/// Mock executor with scripted outputs, failure injection, and optional delay
///
/// Useful for deterministic tests of scheduling, partial failure, and
/// aggregation without any real agent behind the steps.
pub struct MockExecutor {
    behavior: MockBehavior,
    index: AtomicUsize,
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl MockExecutor {
    /// Always succeed with the given content
    pub fn returning(content: Value) -> Self {
        Self::with_behavior(MockBehavior::Always(Ok(StepOutput::new(content))))
    }

    /// Always succeed with a fully specified output
    pub fn returning_output(output: StepOutput) -> Self {
        Self::with_behavior(MockBehavior::Always(Ok(output)))
    }

    /// Always fail with the given message
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_behavior(MockBehavior::Always(Err(message.into())))
    }

    /// Return the given results in order
    pub fn scripted(outputs: Vec<Result<StepOutput, String>>) -> Self {
        Self::with_behavior(MockBehavior::Scripted(outputs))
    }

    fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            index: AtomicUsize::new(0),
            calls: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    /// Add artificial delay to simulate a slow step
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Handle onto the invocation counter
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl StepExecutor for MockExecutor {
    async fn execute(
        &self,
        _step: &AgentStep,
        _input: &Value,
        _context: &SharedMemoryContext,
    ) -> Result<StepOutput, ExecutorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = match &self.behavior {
            MockBehavior::Always(result) => result.clone(),
            MockBehavior::Scripted(outputs) => {
                let idx = self.index.fetch_add(1, Ordering::SeqCst);
                match outputs.get(idx) {
                    Some(result) => result.clone(),
                    None => Err(format!("no scripted output for invocation {}", idx + 1)),
                }
            }
        };

        result.map_err(ExecutorError::Execution)
    }
}

/// Executor that echoes its step id and input back as structured content
pub struct EchoExecutor;

#[async_trait]
impl StepExecutor for EchoExecutor {
    async fn execute(
        &self,
        step: &AgentStep,
        input: &Value,
        _context: &SharedMemoryContext,
    ) -> Result<StepOutput, ExecutorError> {
        Ok(StepOutput::new(json!({
            "echoed_by": step.agent_id,
            "input": input,
        })))
    }
}
