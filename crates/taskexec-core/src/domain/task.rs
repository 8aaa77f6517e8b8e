//! Task record: the only persisted entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{TaskId, TaskStatus};

/// One record per task, owned by the task store.
///
/// `id`, `name` and `created_at` are immutable after creation. `status` and
/// `retry_count` are mutated only by the execution unit and startup recovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub name: String,
    pub status: TaskStatus,

    /// Number of failed attempts so far. Never decremented.
    pub retry_count: u32,

    pub created_at: DateTime<Utc>,
}

impl TaskRecord {
    /// A freshly created record: `PENDING`, no failed attempts.
    pub fn new(id: TaskId, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            status: TaskStatus::Pending,
            retry_count: 0,
            created_at,
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// 1-based number of the attempt that would run next.
    pub fn next_attempt(&self) -> u32 {
        self.retry_count + 1
    }

    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(retry_count) = patch.retry_count {
            self.retry_count = retry_count;
        }
    }
}

/// Partial update of the mutable fields of a record.
///
/// A store applies a patch as a single atomic write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub status: Option<TaskStatus>,
    pub retry_count: Option<u32>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            retry_count: None,
        }
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = Some(retry_count);
        self
    }
}
