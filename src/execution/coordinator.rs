//! Multi-agent coordinator - drives pipeline runs end to end

use crate::core::{
    AgentStep, AgentTransition, ConfigError, PipelineConfig, PipelineResult, PipelineStatus,
    SharedMemoryContext, StepExecution,
};
use crate::execution::{aggregate::aggregate, ExecutorError, ExecutorRegistry, StepExecutor};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Events emitted during a pipeline run
///
/// Instrumentation only; scheduling correctness never depends on handlers
/// being registered.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    PipelineStarted {
        pipeline_id: Uuid,
        pipeline_name: String,
    },
    StepStarted {
        agent_id: String,
        workflow_name: String,
    },
    StepCompleted {
        agent_id: String,
        duration_ms: u64,
    },
    StepFailed {
        agent_id: String,
        error: String,
    },
    PipelineCompleted {
        pipeline_id: Uuid,
        status: PipelineStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(PipelineEvent) + Send + Sync>;

/// The scheduler: validates configs, resolves executors, drives steps
/// according to the transition policy, and aggregates the final result
pub struct MultiAgentCoordinator {
    registry: Arc<ExecutorRegistry>,
    event_handlers: Vec<EventHandler>,
}

impl MultiAgentCoordinator {
    pub fn new(registry: ExecutorRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            event_handlers: Vec::new(),
        }
    }

    pub fn with_registry(registry: Arc<ExecutorRegistry>) -> Self {
        Self {
            registry,
            event_handlers: Vec::new(),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(PipelineEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    fn emit(&self, event: PipelineEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Execute a pipeline and return its aggregated result
    ///
    /// `Err` is returned only for configuration errors detected before any
    /// step runs; every run that passes validation yields `Ok` with all
    /// in-run failures captured in the execution records.
    pub async fn execute_pipeline(
        &self,
        config: &PipelineConfig,
        initial_input: Value,
    ) -> Result<PipelineResult, ConfigError> {
        if let Err(err) = config.validate() {
            error!("Rejecting invalid pipeline config: {}", err);
            return Err(err);
        }

        let mut context = SharedMemoryContext::new();
        let pipeline_id = context.pipeline_id();

        info!(
            "Starting pipeline '{}' ({}) with {} steps, {:?} transition",
            config.pipeline_name,
            pipeline_id,
            config.agent_steps.len(),
            config.transition_type,
        );
        self.emit(PipelineEvent::PipelineStarted {
            pipeline_id,
            pipeline_name: config.pipeline_name.clone(),
        });

        let records = match config.transition_type {
            AgentTransition::Sequential => {
                self.run_sequential(config, &initial_input, &mut context).await
            }
            AgentTransition::Parallel => {
                self.run_parallel(config, &initial_input, &mut context).await
            }
            AgentTransition::Conditional => {
                self.run_conditional(config, &initial_input, &mut context).await
            }
        };

        let status = PipelineStatus::from_records(&records);
        let final_result = aggregate(
            config.output_aggregation,
            config.transition_type,
            &records,
            &context,
        );

        info!(
            "Pipeline '{}' finished: {:?} ({}/{} steps succeeded)",
            config.pipeline_name,
            status,
            records.iter().filter(|r| r.success).count(),
            records.len(),
        );
        self.emit(PipelineEvent::PipelineCompleted {
            pipeline_id,
            status,
        });

        Ok(PipelineResult {
            pipeline_id,
            status,
            execution_results: records,
            final_result,
        })
    }

    /// Run steps strictly in list order, threading each successful result
    /// into the next step's input
    async fn run_sequential(
        &self,
        config: &PipelineConfig,
        initial_input: &Value,
        context: &mut SharedMemoryContext,
    ) -> Vec<StepExecution> {
        let mut records = Vec::with_capacity(config.agent_steps.len());
        let mut previous: Option<Value> = None;

        for step in &config.agent_steps {
            let input = merge_step_input(initial_input, previous.as_ref());
            let record = self.run_one(step, input, context, config.default_timeout_secs).await;

            if record.success {
                previous = Some(record.output.content.clone());
            }
            // A failure leaves `previous` at the last successful result and
            // the run continues to the next listed step.
            self.record_completion(context, &record);
            records.push(record);
        }

        records
    }

    /// Launch every step concurrently against the same input snapshot and
    /// join before aggregating
    async fn run_parallel(
        &self,
        config: &PipelineConfig,
        initial_input: &Value,
        context: &mut SharedMemoryContext,
    ) -> Vec<StepExecution> {
        // Steps see the context as of launch; results are written back by
        // this (single) writer as joins complete.
        let snapshot = Arc::new(context.clone());
        let mut tasks: JoinSet<StepExecution> = JoinSet::new();

        for step in &config.agent_steps {
            self.note_step_started(context, step);
            let executor = self.registry.resolve(&step.workflow_name);
            tasks.spawn(guarded_invoke(
                executor,
                step.clone(),
                initial_input.clone(),
                Arc::clone(&snapshot),
                config.default_timeout_secs,
            ));
        }

        let mut records = Vec::with_capacity(config.agent_steps.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(record) => {
                    self.record_completion(context, &record);
                    records.push(record);
                }
                // guarded_invoke contains panics from executor tasks, so the
                // wrapper itself only fails on runtime shutdown.
                Err(err) => error!("Parallel step task lost: {}", err),
            }
        }

        records
    }

    /// Start at the first listed step; after each completion follow its
    /// `conditional_next` edge, else fall through to the next list entry
    async fn run_conditional(
        &self,
        config: &PipelineConfig,
        initial_input: &Value,
        context: &mut SharedMemoryContext,
    ) -> Vec<StepExecution> {
        let mut records = Vec::new();
        let mut previous: Option<Value> = None;
        let mut executed: HashSet<String> = HashSet::new();
        let mut current = Some(0);

        while let Some(index) = current {
            let step = &config.agent_steps[index];

            if !executed.insert(step.agent_id.clone()) {
                // Routing arrived back at a step that already ran this run
                warn!(
                    "Conditional routing revisited step '{}', terminating run",
                    step.agent_id
                );
                context.log(&step.agent_id, "routing revisited step, run terminated");
                break;
            }

            let input = merge_step_input(initial_input, previous.as_ref());
            let record = self.run_one(step, input, context, config.default_timeout_secs).await;

            if record.success {
                previous = Some(record.output.content.clone());
            }
            self.record_completion(context, &record);
            records.push(record);

            current = match step.next_target() {
                Some(target) => {
                    debug!("Step '{}' routes to '{}'", step.agent_id, target);
                    // Validation guarantees the target exists
                    config.step_index(target)
                }
                None if index + 1 < config.agent_steps.len() => Some(index + 1),
                None => None,
            };
        }

        records
    }

    /// Execute one step in-line (sequential and conditional transitions)
    async fn run_one(
        &self,
        step: &AgentStep,
        input: Value,
        context: &mut SharedMemoryContext,
        timeout_secs: Option<u64>,
    ) -> StepExecution {
        self.note_step_started(context, step);
        let executor = self.registry.resolve(&step.workflow_name);
        guarded_invoke(
            executor,
            step.clone(),
            input,
            Arc::new(context.clone()),
            timeout_secs,
        )
        .await
    }

    fn note_step_started(&self, context: &mut SharedMemoryContext, step: &AgentStep) {
        info!("Executing step '{}' ({})", step.agent_id, step.workflow_name);
        context.log(&step.agent_id, "step started");
        self.emit(PipelineEvent::StepStarted {
            agent_id: step.agent_id.clone(),
            workflow_name: step.workflow_name.clone(),
        });
    }

    /// Write one finished attempt into the shared context, in causal order
    fn record_completion(&self, context: &mut SharedMemoryContext, record: &StepExecution) {
        match &record.error {
            None => {
                context.log(
                    &record.agent_id,
                    format!("step completed in {}ms", record.duration_ms),
                );
                self.emit(PipelineEvent::StepCompleted {
                    agent_id: record.agent_id.clone(),
                    duration_ms: record.duration_ms,
                });
            }
            Some(err) => {
                context.log(&record.agent_id, format!("step failed: {}", err));
                self.emit(PipelineEvent::StepFailed {
                    agent_id: record.agent_id.clone(),
                    error: err.clone(),
                });
            }
        }
        context.add_step_result(&record.agent_id, record.output.content.clone(), record.success);
        if !record.output.messages.is_empty() {
            context.merge_into_memory(record.output.messages.clone());
        }
    }
}

/// Merge the pipeline's initial input with the previous step's result
///
/// Object results merge key-wise over the initial input; non-object results
/// land under `"previous_result"`. A non-object initial input is wrapped as
/// `{"input": ...}` so there is always a mapping to merge into.
fn merge_step_input(initial: &Value, previous: Option<&Value>) -> Value {
    let mut merged = match initial {
        Value::Object(map) => map.clone(),
        other => {
            let mut map = Map::new();
            map.insert("input".to_string(), other.clone());
            map
        }
    };

    match previous {
        Some(Value::Object(prev)) => {
            for (key, value) in prev {
                merged.insert(key.clone(), value.clone());
            }
        }
        Some(other) => {
            merged.insert("previous_result".to_string(), other.clone());
        }
        None => {}
    }

    Value::Object(merged)
}

/// Invoke a resolved executor, containing every failure mode as a record
///
/// Resolution misses, executor errors, timeouts, and panics all become
/// failed execution records; nothing propagates out of the run.
async fn guarded_invoke(
    executor: Option<Arc<dyn StepExecutor>>,
    step: AgentStep,
    input: Value,
    context: Arc<SharedMemoryContext>,
    timeout_secs: Option<u64>,
) -> StepExecution {
    let agent_id = step.agent_id.clone();
    let workflow_name = step.workflow_name.clone();

    let Some(executor) = executor else {
        return StepExecution::failed(
            agent_id,
            workflow_name.clone(),
            format!("no executor registered for workflow '{}'", workflow_name),
            0,
        );
    };

    let task = tokio::spawn(invoke_step(executor, step, input, context, timeout_secs));
    match task.await {
        Ok(record) => record,
        Err(err) => {
            error!("Step '{}' task panicked: {}", agent_id, err);
            StepExecution::failed(
                agent_id,
                workflow_name,
                format!("step task panicked: {}", err),
                0,
            )
        }
    }
}

async fn invoke_step(
    executor: Arc<dyn StepExecutor>,
    step: AgentStep,
    input: Value,
    context: Arc<SharedMemoryContext>,
    timeout_secs: Option<u64>,
) -> StepExecution {
    let start = Instant::now();

    let result = match timeout_secs {
        Some(secs) => match timeout(
            Duration::from_secs(secs),
            executor.execute(&step, &input, &context),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ExecutorError::Timeout(secs)),
        },
        None => executor.execute(&step, &input, &context).await,
    };

    let duration_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(output) => {
            debug!("Step '{}' succeeded in {}ms", step.agent_id, duration_ms);
            StepExecution::succeeded(step.agent_id, step.workflow_name, output, duration_ms)
        }
        Err(err) => {
            error!("Step '{}' failed: {}", step.agent_id, err);
            StepExecution::failed(step.agent_id, step.workflow_name, err.to_string(), duration_ms)
        }
    }
}
