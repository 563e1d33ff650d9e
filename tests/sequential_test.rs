//! Sequential transition scenarios

mod helpers;

use agentflow::{
    AgentStep, ExecutorRegistry, MultiAgentCoordinator, OutputAggregation, PipelineConfig,
    PipelineStatus, StepOutput,
};
use helpers::{EchoExecutor, MockExecutor};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn two_steps_both_succeed() {
    helpers::init_tracing();
    let mut registry = ExecutorRegistry::new();
    registry.register("plan", Arc::new(MockExecutor::returning(json!({"plan": "outline"}))));
    registry.register("write", Arc::new(MockExecutor::returning(json!("final draft"))));
    let coordinator = MultiAgentCoordinator::new(registry);

    let config = PipelineConfig::new(
        "draft",
        vec![AgentStep::new("s1", "plan"), AgentStep::new("s2", "write")],
    );

    let result = coordinator
        .execute_pipeline(&config, json!({"topic": "pipelines"}))
        .await
        .unwrap();

    assert_eq!(result.status, PipelineStatus::Success);
    assert_eq!(result.execution_results.len(), 2);
    assert_eq!(result.execution_results[0].agent_id, "s1");
    assert_eq!(result.execution_results[1].agent_id, "s2");
    // last_step: step 2's content
    assert_eq!(result.final_result, json!("final draft"));
}

#[tokio::test]
async fn later_step_sees_previous_result() {
    let mut registry = ExecutorRegistry::new();
    registry.register("plan", Arc::new(MockExecutor::returning(json!({"plan": "outline"}))));
    registry.register("echo", Arc::new(EchoExecutor));
    let coordinator = MultiAgentCoordinator::new(registry);

    let config = PipelineConfig::new(
        "threading",
        vec![AgentStep::new("s1", "plan"), AgentStep::new("s2", "echo")],
    );

    let result = coordinator
        .execute_pipeline(&config, json!({"topic": "pipelines"}))
        .await
        .unwrap();

    // Step 2's input is the merge of the initial input and step 1's result
    let echoed_input = &result.execution_results[1].output.content["input"];
    assert_eq!(echoed_input["topic"], json!("pipelines"));
    assert_eq!(echoed_input["plan"], json!("outline"));
}

#[tokio::test]
async fn failure_does_not_halt_the_run() {
    let mut registry = ExecutorRegistry::new();
    registry.register("flaky", Arc::new(MockExecutor::failing("model unavailable")));
    registry.register("write", Arc::new(MockExecutor::returning(json!("recovered"))));
    let coordinator = MultiAgentCoordinator::new(registry);

    let config = PipelineConfig::new(
        "resilient",
        vec![AgentStep::new("s1", "flaky"), AgentStep::new("s2", "write")],
    );

    let result = coordinator.execute_pipeline(&config, json!({})).await.unwrap();

    assert_eq!(result.status, PipelineStatus::PartialFailure);
    assert_eq!(result.execution_results.len(), 2);
    assert!(!result.execution_results[0].success);
    assert!(result.execution_results[1].success);
    // Aggregation still recovers the successful step's result
    assert_eq!(result.final_result, json!("recovered"));
}

#[tokio::test]
async fn all_steps_failing_yields_failure_status() {
    let mut registry = ExecutorRegistry::new();
    registry.register("flaky", Arc::new(MockExecutor::failing("down")));
    let coordinator = MultiAgentCoordinator::new(registry);

    let config = PipelineConfig::new(
        "doomed",
        vec![AgentStep::new("s1", "flaky"), AgentStep::new("s2", "flaky")],
    );

    let result = coordinator.execute_pipeline(&config, json!({})).await.unwrap();

    assert_eq!(result.status, PipelineStatus::Failure);
    // last_step has nothing to return
    assert!(result.final_result.is_null());
}

#[tokio::test]
async fn all_steps_aggregation_includes_every_record() {
    let mut registry = ExecutorRegistry::new();
    registry.register("plan", Arc::new(MockExecutor::returning(json!("a"))));
    registry.register("flaky", Arc::new(MockExecutor::failing("nope")));
    let coordinator = MultiAgentCoordinator::new(registry);

    let config = PipelineConfig::new(
        "report-all",
        vec![AgentStep::new("s1", "plan"), AgentStep::new("s2", "flaky")],
    )
    .with_aggregation(OutputAggregation::AllSteps);

    let result = coordinator.execute_pipeline(&config, json!({})).await.unwrap();

    let all = result.final_result["all_results"].as_array().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0]["success"], json!(true));
    assert_eq!(all[1]["success"], json!(false));
}

#[tokio::test]
async fn later_step_can_read_context_results() {
    use agentflow::{ExecutorError, SharedMemoryContext, StepExecutor};
    use async_trait::async_trait;
    use serde_json::Value;

    /// Reads a prior step's stored result out of the shared context
    struct ContextProbeExecutor;

    #[async_trait]
    impl StepExecutor for ContextProbeExecutor {
        async fn execute(
            &self,
            _step: &AgentStep,
            _input: &Value,
            context: &SharedMemoryContext,
        ) -> Result<StepOutput, ExecutorError> {
            let prior = context
                .get_step_result("s1")
                .map(|stored| stored.result.clone())
                .unwrap_or(Value::Null);
            Ok(StepOutput::new(json!({"saw": prior})))
        }
    }

    let mut registry = ExecutorRegistry::new();
    registry.register("plan", Arc::new(MockExecutor::returning(json!("the plan"))));
    registry.register("probe", Arc::new(ContextProbeExecutor));
    let coordinator = MultiAgentCoordinator::new(registry);

    let config = PipelineConfig::new(
        "probing",
        vec![AgentStep::new("s1", "plan"), AgentStep::new("s2", "probe")],
    );

    let result = coordinator.execute_pipeline(&config, json!({})).await.unwrap();
    assert_eq!(
        result.execution_results[1].output.content,
        json!({"saw": "the plan"})
    );
}

#[tokio::test]
async fn step_messages_merge_into_run_memory_via_records() {
    use agentflow::MemoryMessage;

    let mut registry = ExecutorRegistry::new();
    registry.register(
        "chat",
        Arc::new(MockExecutor::returning_output(
            StepOutput::new(json!("hi")).with_messages(vec![
                MemoryMessage::new("assistant", "hi"),
            ]),
        )),
    );
    let coordinator = MultiAgentCoordinator::new(registry);

    let config = PipelineConfig::new("memory", vec![AgentStep::new("s1", "chat")]);
    let result = coordinator.execute_pipeline(&config, json!({})).await.unwrap();

    // The messages ride along on the execution record
    assert_eq!(result.execution_results[0].output.messages.len(), 1);
}
