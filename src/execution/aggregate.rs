//! Result aggregation - composes one final result from execution records

use crate::core::{
    AgentTransition, OutputAggregation, SharedMemoryContext, StepExecution,
};
use serde_json::{json, Value};

/// Build the final result from the execution records and shared context
///
/// Pure over its inputs and infallible: malformed or opaque step outputs
/// contribute no artifacts or citations instead of erroring.
pub fn aggregate(
    policy: OutputAggregation,
    transition: AgentTransition,
    records: &[StepExecution],
    context: &SharedMemoryContext,
) -> Value {
    match (policy, transition) {
        (OutputAggregation::LastStep, _) => last_step(records),
        (OutputAggregation::AllSteps, AgentTransition::Parallel) => {
            parallel_all_steps(records, context)
        }
        (OutputAggregation::AllSteps, _) => all_steps(records, context),
    }
}

/// Content of the last successful record in causal order
///
/// Causal order is completion order, which under parallel or conditional
/// transitions need not match list order. Null when nothing succeeded.
fn last_step(records: &[StepExecution]) -> Value {
    records
        .iter()
        .rev()
        .find(|r| r.success)
        .map(|r| r.output.content.clone())
        .unwrap_or(Value::Null)
}

/// All records verbatim plus a snapshot of the shared variables
fn all_steps(records: &[StepExecution], context: &SharedMemoryContext) -> Value {
    json!({
        "all_results": records,
        "shared_variables": context.shared_variables(),
    })
}

/// Parallel variant of `all_steps`
///
/// Partitions records into all/successful and merges per-step artifacts and
/// citations into deduplicated top-level collections.
fn parallel_all_steps(records: &[StepExecution], context: &SharedMemoryContext) -> Value {
    let successful: Vec<&StepExecution> = records.iter().filter(|r| r.success).collect();

    let mut artifacts: Vec<Value> = Vec::new();
    let mut citations: Vec<Value> = Vec::new();
    for record in records {
        merge_unique(&mut artifacts, &record.output.artifacts);
        merge_unique(&mut citations, &record.output.citations);
    }

    json!({
        "parallel_results": records,
        "successful_results": successful,
        "artifacts": artifacts,
        "citations": citations,
        "shared_variables": context.shared_variables(),
    })
}

fn merge_unique(target: &mut Vec<Value>, items: &[Value]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}
