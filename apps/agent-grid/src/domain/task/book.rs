//! Task Book
//!
//! Owns every task the executor knows about, in exactly one of three places:
//!
//! - **pending**: submitted, waiting for a drain tick
//! - **active**: handed to a routine; only bookkeeping is kept here, the
//!   task itself is owned by the running execution
//! - **history**: terminal results, keyed by task id, never removed or
//!   overwritten
//!
//! Every transition is a single `&mut self` call, so a task can never be
//! observed in two places at once.

use std::collections::HashMap;

use super::errors::TaskError;
use super::model::{ExecutionTask, TaskResult, TaskUpdate};
use super::value_objects::TaskType;
use crate::domain::shared::{AgentAddress, TaskId, Timestamp};

/// A submitted task together with the mailbox that submitted it.
#[derive(Debug, Clone)]
pub struct QueuedTask {
    /// The task.
    pub task: ExecutionTask,
    /// Who receives the updates and the result.
    pub submitter: AgentAddress,
}

/// Bookkeeping for a task that is currently executing.
#[derive(Debug, Clone)]
pub struct ActiveTask {
    /// Type of the running task.
    pub task_type: TaskType,
    /// Who receives the result.
    pub submitter: AgentAddress,
    /// When execution began.
    pub started_at: Timestamp,
}

/// Which collection a task id currently lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskLocation {
    /// Waiting in the queue.
    Pending,
    /// Executing.
    Active,
    /// Finished.
    History,
}

/// A result that has just been recorded, with its routing information.
#[derive(Debug, Clone)]
pub struct CompletedTask {
    /// The recorded result.
    pub result: TaskResult,
    /// Who receives it.
    pub submitter: AgentAddress,
    /// Type of the finished task.
    pub task_type: TaskType,
    /// When execution began.
    pub started_at: Timestamp,
}

/// Pending queue, active set and result history for one executor.
#[derive(Debug, Default)]
pub struct TaskBook {
    pending: Vec<QueuedTask>,
    active: HashMap<TaskId, ActiveTask>,
    history: HashMap<TaskId, TaskResult>,
}

impl TaskBook {
    /// Create an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task to the pending queue.
    ///
    /// Ids are unique across all three collections; re-using one is an error.
    pub fn submit(&mut self, task: ExecutionTask, submitter: AgentAddress) -> Result<(), TaskError> {
        if let Some(location) = self.locate(&task.task_id) {
            return Err(TaskError::DuplicateTaskId {
                task_id: task.task_id,
                location,
            });
        }
        self.pending.push(QueuedTask { task, submitter });
        Ok(())
    }

    /// Remove up to `max` tasks from the queue, highest priority first,
    /// and mark them active.
    ///
    /// The sort is stable, so equal priorities leave in submission order.
    pub fn take_batch(&mut self, max: usize) -> Vec<QueuedTask> {
        self.pending
            .sort_by(|a, b| b.task.priority.cmp(&a.task.priority));

        let count = max.min(self.pending.len());
        let batch: Vec<QueuedTask> = self.pending.drain(..count).collect();

        let started_at = Timestamp::now();
        for queued in &batch {
            self.active.insert(
                queued.task.task_id.clone(),
                ActiveTask {
                    task_type: queued.task.task_type,
                    submitter: queued.submitter.clone(),
                    started_at,
                },
            );
        }

        batch
    }

    /// Move a task from the active set into history.
    pub fn complete(&mut self, result: TaskResult) -> Result<CompletedTask, TaskError> {
        if !result.status.is_terminal() {
            return Err(TaskError::NonTerminalResult {
                task_id: result.task_id,
                status: result.status,
            });
        }

        let Some(active) = self.active.remove(&result.task_id) else {
            return Err(TaskError::NotActive {
                task_id: result.task_id,
            });
        };

        self.history.insert(result.task_id.clone(), result.clone());

        Ok(CompletedTask {
            result,
            submitter: active.submitter,
            task_type: active.task_type,
            started_at: active.started_at,
        })
    }

    /// Build the status reply for a task id.
    #[must_use]
    pub fn status(&self, task_id: &TaskId) -> TaskUpdate {
        match self.locate(task_id) {
            Some(TaskLocation::Active) => TaskUpdate::in_progress(task_id.clone()),
            Some(TaskLocation::History) => self
                .history
                .get(task_id)
                .map_or_else(|| TaskUpdate::not_found(task_id.clone()), TaskUpdate::finished),
            Some(TaskLocation::Pending) => TaskUpdate::queued(task_id.clone()),
            None => TaskUpdate::not_found(task_id.clone()),
        }
    }

    /// Find which collection holds a task id.
    #[must_use]
    pub fn locate(&self, task_id: &TaskId) -> Option<TaskLocation> {
        if self.active.contains_key(task_id) {
            Some(TaskLocation::Active)
        } else if self.history.contains_key(task_id) {
            Some(TaskLocation::History)
        } else if self.pending.iter().any(|q| &q.task.task_id == task_id) {
            Some(TaskLocation::Pending)
        } else {
            None
        }
    }

    /// Recorded result for a task, if it has finished.
    #[must_use]
    pub fn result(&self, task_id: &TaskId) -> Option<&TaskResult> {
        self.history.get(task_id)
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of executing tasks.
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Number of recorded results.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}
