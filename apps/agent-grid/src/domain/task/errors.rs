//! Task lifecycle errors.

use super::book::TaskLocation;
use super::value_objects::TaskStatus;
use crate::domain::shared::TaskId;

/// Errors raised by illegal task transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The id is already pending, active or recorded.
    #[error("duplicate task id {task_id} (already {location:?})")]
    DuplicateTaskId {
        /// The re-used id.
        task_id: TaskId,
        /// Where the existing task lives.
        location: TaskLocation,
    },

    /// A result arrived for a task that is not executing.
    #[error("task {task_id} is not active")]
    NotActive {
        /// The unexpected id.
        task_id: TaskId,
    },

    /// Only completed or failed results can enter history.
    #[error("task {task_id} result has non-terminal status {status}")]
    NonTerminalResult {
        /// The task id.
        task_id: TaskId,
        /// The offending status.
        status: TaskStatus,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_message_names_location() {
        let err = TaskError::DuplicateTaskId {
            task_id: TaskId::new("t1"),
            location: TaskLocation::History,
        };
        let msg = err.to_string();
        assert!(msg.contains("t1"));
        assert!(msg.contains("History"));
    }
}
