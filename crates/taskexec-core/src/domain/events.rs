//! Events - 実行ユニットとリカバリが発行する観測イベント

use super::TaskId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionEvent {
    /// The record was moved to `RUNNING` and the work is about to run.
    Started { task_id: TaskId, attempt: u32 },

    Completed { task_id: TaskId, attempt: u32 },

    /// The attempt faulted and the task was re-queued.
    Retrying {
        task_id: TaskId,
        attempt: u32,
        limit: u32,
        reason: String,
    },

    PermanentlyFailed {
        task_id: TaskId,
        attempts: u32,
        reason: String,
    },

    /// Startup recovery reset a stranded task to `PENDING`.
    Recovered { task_id: TaskId },
}

impl ExecutionEvent {
    pub fn task_id(&self) -> TaskId {
        match self {
            ExecutionEvent::Started { task_id, .. }
            | ExecutionEvent::Completed { task_id, .. }
            | ExecutionEvent::Retrying { task_id, .. }
            | ExecutionEvent::PermanentlyFailed { task_id, .. }
            | ExecutionEvent::Recovered { task_id } => *task_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExecutionEvent::Started { .. } => "started",
            ExecutionEvent::Completed { .. } => "completed",
            ExecutionEvent::Retrying { .. } => "retrying",
            ExecutionEvent::PermanentlyFailed { .. } => "permanently_failed",
            ExecutionEvent::Recovered { .. } => "recovered",
        }
    }
}
