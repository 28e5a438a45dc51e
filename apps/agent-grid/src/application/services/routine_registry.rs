//! Routine Registry
//!
//! Maps each `TaskType` to the routine that runs it and turns a routine's
//! outcome into a terminal `TaskResult`.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::application::ports::{ExecutionError, TaskRoutine};
use crate::domain::task::{ExecutionTask, TaskResult, TaskType};

/// Explicit `TaskType` → routine table.
#[derive(Clone, Default)]
pub struct RoutineRegistry {
    routines: HashMap<TaskType, Arc<dyn TaskRoutine>>,
}

impl fmt::Debug for RoutineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&str> = self.routines.keys().map(TaskType::as_str).collect();
        types.sort_unstable();
        f.debug_struct("RoutineRegistry")
            .field("types", &types)
            .finish()
    }
}

impl RoutineRegistry {
    /// Create an empty registry. Every task fails until routines are added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a routine under its own task type, replacing any earlier one.
    pub fn register(&mut self, routine: Arc<dyn TaskRoutine>) -> Option<Arc<dyn TaskRoutine>> {
        self.routines.insert(routine.task_type(), routine)
    }

    /// Builder form of `register`.
    #[must_use]
    pub fn with(mut self, routine: Arc<dyn TaskRoutine>) -> Self {
        self.register(routine);
        self
    }

    /// Whether a routine exists for the type.
    #[must_use]
    pub fn supports(&self, task_type: TaskType) -> bool {
        self.routines.contains_key(&task_type)
    }

    /// Build the future that executes a task.
    ///
    /// The future owns the task and never fails: an unmapped type or a
    /// routine error becomes a failed result.
    pub fn dispatch(&self, task: ExecutionTask) -> impl Future<Output = TaskResult> + Send + 'static {
        let routine = self.routines.get(&task.task_type).cloned();

        async move {
            let Some(routine) = routine else {
                let error = ExecutionError::UnsupportedTaskType {
                    task_type: task.task_type,
                };
                return TaskResult::failed(task.task_id, error.to_string());
            };

            match routine.execute(&task).await {
                Ok(output) => TaskResult::completed(
                    task.task_id,
                    output.payload,
                    output.gas_used,
                    output.transaction_hash,
                ),
                Err(e) => {
                    tracing::warn!(task_id = %task.task_id, error = %e, "Task routine failed");
                    TaskResult::failed(task.task_id, e.to_string())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::RoutineOutput;
    use crate::domain::task::{Parameters, TaskStatus};
    use async_trait::async_trait;

    struct Fixed {
        task_type: TaskType,
        outcome: Result<u64, ExecutionError>,
    }

    #[async_trait]
    impl TaskRoutine for Fixed {
        fn task_type(&self) -> TaskType {
            self.task_type
        }

        async fn execute(&self, _task: &ExecutionTask) -> Result<RoutineOutput, ExecutionError> {
            self.outcome.clone().map(|gas_used| RoutineOutput {
                payload: Parameters::new(),
                gas_used,
                transaction_hash: "0xfeed".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn unmapped_type_fails_immediately() {
        let registry = RoutineRegistry::new();
        let result = registry
            .dispatch(ExecutionTask::new("t1", TaskType::Bridge, "0x"))
            .await;
        assert_eq!(result.status, TaskStatus::Failed);
        assert_eq!(result.error.as_deref(), Some("Unsupported task type: bridge"));
    }

    #[tokio::test]
    async fn routine_output_becomes_completed_result() {
        let registry = RoutineRegistry::new().with(Arc::new(Fixed {
            task_type: TaskType::Trade,
            outcome: Ok(7),
        }));
        assert!(registry.supports(TaskType::Trade));

        let result = registry
            .dispatch(ExecutionTask::new("t1", TaskType::Trade, "0x"))
            .await;
        assert!(result.is_success());
        assert_eq!(result.gas_used, Some(7));
        assert_eq!(result.transaction_hash.as_deref(), Some("0xfeed"));
    }

    #[tokio::test]
    async fn routine_error_becomes_failed_result() {
        let registry = RoutineRegistry::new().with(Arc::new(Fixed {
            task_type: TaskType::Swap,
            outcome: Err(ExecutionError::InvalidParameter {
                key: "amount_in".to_string(),
                expected: "number",
            }),
        }));

        let result = registry
            .dispatch(ExecutionTask::new("t2", TaskType::Swap, "0x"))
            .await;
        assert_eq!(result.status, TaskStatus::Failed);
        assert_eq!(
            result.error.as_deref(),
            Some("Invalid parameter 'amount_in': expected number")
        );
    }
}
