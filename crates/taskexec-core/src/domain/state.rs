//! Task status state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a task record.
///
/// State transitions:
/// - Pending -> Running -> Completed
/// - Pending -> Running -> Pending (retry, loop while retries remain)
/// - Pending -> Running -> Failed (retries exhausted)
/// - Running -> Pending (startup recovery of an interrupted run)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Queued, not yet running.
    Pending,

    /// An attempt is in progress.
    Running,

    /// Terminal success.
    Completed,

    /// Terminal failure, retries exhausted.
    Failed,
}

impl TaskStatus {
    /// Statuses a prior process may have left behind mid-flight.
    pub const NON_TERMINAL: [TaskStatus; 2] = [TaskStatus::Running, TaskStatus::Pending];

    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::Running,
        TaskStatus::Completed,
        TaskStatus::Failed,
    ];

    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
