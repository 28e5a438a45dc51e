//! Task Routine Port (Driven Port)
//!
//! A routine performs one type of task. Routines are looked up by
//! `TaskType`; a type without a routine fails immediately.

use async_trait::async_trait;

use crate::domain::task::{ExecutionTask, Parameters, TaskType};

/// Errors raised while executing a task.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    /// No routine is registered for the type.
    #[error("Unsupported task type: {task_type}")]
    UnsupportedTaskType {
        /// The unmapped type.
        task_type: TaskType,
    },

    /// A parameter was present with the wrong JSON type.
    #[error("Invalid parameter '{key}': expected {expected}")]
    InvalidParameter {
        /// Parameter name.
        key: String,
        /// Expected JSON type.
        expected: &'static str,
    },

    /// The routine panicked.
    #[error("Task execution aborted: {message}")]
    Aborted {
        /// Panic or cancellation details.
        message: String,
    },
}

/// What a successful routine produces.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutineOutput {
    /// Routine-specific result payload.
    pub payload: Parameters,
    /// Simulated gas consumed.
    pub gas_used: u64,
    /// Simulated transaction hash.
    pub transaction_hash: String,
}

/// Port for executing one type of task.
#[async_trait]
pub trait TaskRoutine: Send + Sync {
    /// The task type this routine handles.
    fn task_type(&self) -> TaskType;

    /// Run the task to completion.
    async fn execute(&self, task: &ExecutionTask) -> Result<RoutineOutput, ExecutionError>;
}
