//! Executor registry - resolves workflow names to step executors

use crate::execution::StepExecutor;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Registry of available step executors, keyed by workflow name
///
/// Populated at startup and owned by (or injected into) a coordinator; there
/// is no process-wide singleton, so tests can construct isolated instances.
/// A failed resolution is not terminal - it is surfaced to the coordinator
/// as a normal step failure and later lookups of other names still work.
#[derive(Default)]
pub struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn StepExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    /// Register an executor under a workflow name
    pub fn register(&mut self, workflow_name: impl Into<String>, executor: Arc<dyn StepExecutor>) {
        self.executors.insert(workflow_name.into(), executor);
    }

    /// Remove an executor by workflow name
    pub fn unregister(&mut self, workflow_name: &str) -> bool {
        self.executors.remove(workflow_name).is_some()
    }

    /// Resolve a workflow name to an executor
    pub fn resolve(&self, workflow_name: &str) -> Option<Arc<dyn StepExecutor>> {
        let executor = self.executors.get(workflow_name).cloned();
        if executor.is_none() {
            warn!("No executor registered for workflow '{}'", workflow_name);
        }
        executor
    }

    /// List all registered workflow names
    pub fn list(&self) -> Vec<&str> {
        self.executors.keys().map(|s| s.as_str()).collect()
    }
}
