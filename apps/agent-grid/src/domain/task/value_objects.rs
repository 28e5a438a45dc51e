//! Task type tags and lifecycle statuses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of work a task asks the executor to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    /// Buy or sell an asset.
    Trade,
    /// Stake tokens with a validator.
    Stake,
    /// Withdraw a stake.
    Unstake,
    /// Swap one token for another.
    Swap,
    /// Move tokens across chains.
    Bridge,
    /// Anything else.
    Custom,
}

impl TaskType {
    /// Every task type, in declaration order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Trade,
            Self::Stake,
            Self::Unstake,
            Self::Swap,
            Self::Bridge,
            Self::Custom,
        ]
    }

    /// Lower-case wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trade => "trade",
            Self::Stake => "stake",
            Self::Unstake => "unstake",
            Self::Swap => "swap",
            Self::Bridge => "bridge",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a task is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Queued, or unknown to the executor.
    Pending,
    /// Occupying the active set.
    InProgress,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
}

impl TaskStatus {
    /// Returns true for the two statuses a `TaskResult` may carry.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Lower-case wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::InProgress.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
    }

    #[test]
    fn task_type_wire_names() {
        for task_type in TaskType::all() {
            let json = serde_json::to_string(task_type).unwrap();
            assert_eq!(json, format!("\"{}\"", task_type.as_str()));
        }
    }

    #[test]
    fn status_serialises_snake_case() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }
}
