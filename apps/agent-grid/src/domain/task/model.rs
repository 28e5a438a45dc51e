//! Task, result and status-update records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::value_objects::{TaskStatus, TaskType};
use crate::domain::shared::{TaskId, Timestamp};

/// Free-form task parameters, as a JSON object.
pub type Parameters = Map<String, Value>;

const fn default_priority() -> i32 {
    1
}

/// A unit of requested work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionTask {
    /// Submitter-chosen identifier.
    pub task_id: TaskId,
    /// What kind of work to do.
    pub task_type: TaskType,
    /// Wallet address of the user the work is for. Not validated.
    pub user_address: String,
    /// Routine-specific parameters.
    #[serde(default)]
    pub parameters: Parameters,
    /// Higher runs first.
    #[serde(default = "default_priority")]
    pub priority: i32,
    /// Carried for callers; the executor does not enforce it.
    #[serde(default)]
    pub deadline: Option<Timestamp>,
}

impl ExecutionTask {
    /// Create a task with no parameters and the default priority.
    #[must_use]
    pub fn new(task_id: impl Into<TaskId>, task_type: TaskType, user_address: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            task_type,
            user_address: user_address.into(),
            parameters: Parameters::new(),
            priority: default_priority(),
            deadline: None,
        }
    }

    /// Add one parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Set the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Terminal outcome of a task. Never changed once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Task this result belongs to.
    pub task_id: TaskId,
    /// `Completed` or `Failed`.
    pub status: TaskStatus,
    /// Routine output on success.
    pub result: Option<Parameters>,
    /// Error text on failure.
    pub error: Option<String>,
    /// Simulated gas consumed.
    pub gas_used: Option<u64>,
    /// Simulated transaction hash.
    pub transaction_hash: Option<String>,
    /// When the result was produced.
    pub timestamp: Timestamp,
}

impl TaskResult {
    /// A successful result.
    #[must_use]
    pub fn completed(
        task_id: TaskId,
        payload: Parameters,
        gas_used: u64,
        transaction_hash: impl Into<String>,
    ) -> Self {
        Self {
            task_id,
            status: TaskStatus::Completed,
            result: Some(payload),
            error: None,
            gas_used: Some(gas_used),
            transaction_hash: Some(transaction_hash.into()),
            timestamp: Timestamp::now(),
        }
    }

    /// A failed result.
    #[must_use]
    pub fn failed(task_id: TaskId, error: impl Into<String>) -> Self {
        Self {
            task_id,
            status: TaskStatus::Failed,
            result: None,
            error: Some(error.into()),
            gas_used: None,
            transaction_hash: None,
            timestamp: Timestamp::now(),
        }
    }

    /// Whether the task completed successfully.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Status snapshot sent in reply to a status query or when execution starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    /// Task the update is about.
    pub task_id: TaskId,
    /// Current status.
    pub status: TaskStatus,
    /// Fraction done, 0.0 to 1.0. Stub values only.
    pub progress: f64,
    /// Human-readable description.
    pub message: String,
    /// When the update was produced.
    pub timestamp: Timestamp,
}

impl TaskUpdate {
    fn new(task_id: TaskId, status: TaskStatus, progress: f64, message: String) -> Self {
        Self {
            task_id,
            status,
            progress,
            message,
            timestamp: Timestamp::now(),
        }
    }

    /// Sent to the submitter when a task leaves the queue.
    #[must_use]
    pub fn starting(task: &ExecutionTask) -> Self {
        Self::new(
            task.task_id.clone(),
            TaskStatus::InProgress,
            0.1,
            format!("Starting {} task", task.task_type),
        )
    }

    /// Reply for a task in the active set.
    #[must_use]
    pub fn in_progress(task_id: TaskId) -> Self {
        let message = format!("Task {task_id} is in progress");
        Self::new(task_id, TaskStatus::InProgress, 0.5, message)
    }

    /// Reply for a task with a recorded result.
    #[must_use]
    pub fn finished(result: &TaskResult) -> Self {
        let progress = if result.is_success() { 1.0 } else { 0.0 };
        Self::new(
            result.task_id.clone(),
            result.status,
            progress,
            format!(
                "Task {} completed with status: {}",
                result.task_id, result.status
            ),
        )
    }

    /// Reply for a task still waiting in the queue.
    #[must_use]
    pub fn queued(task_id: TaskId) -> Self {
        let message = format!("Task {task_id} is pending");
        Self::new(task_id, TaskStatus::Pending, 0.0, message)
    }

    /// Reply for an id the executor has never seen.
    #[must_use]
    pub fn not_found(task_id: TaskId) -> Self {
        let message = format!("Task {task_id} not found");
        Self::new(task_id, TaskStatus::Pending, 0.0, message)
    }
}
