//! TaskStore port - タスクレコードの正本（source of truth）
//!
//! 永続化層そのものはこのクレートの外にあります。
//! ここでは実行コアが必要とする最小限の操作だけを定義します。

use async_trait::async_trait;

use crate::domain::{StoreError, TaskId, TaskPatch, TaskRecord, TaskStatus};

/// TaskStore は 1 タスク 1 レコードを保持する
///
/// # 設計原則
/// - 各 update は単一のアトミックな書き込み
/// - レコードが存在しないことはエラーではなく `None` で表す
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Point lookup.
    async fn get(&self, id: TaskId) -> Result<Option<TaskRecord>, StoreError>;

    /// All records whose status is one of `statuses`, in creation order.
    async fn list_by_status(&self, statuses: &[TaskStatus]) -> Result<Vec<TaskRecord>, StoreError>;

    /// Create a `PENDING` record with `retry_count` 0.
    async fn create(&self, name: &str) -> Result<TaskRecord, StoreError>;

    /// Atomically apply `patch`. Returns the updated record, or `None` if the
    /// record does not exist.
    async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Option<TaskRecord>, StoreError>;

    /// Apply `patch` to every listed record in one atomic step. Returns the
    /// identifiers that existed and were updated.
    async fn update_many(&self, ids: &[TaskId], patch: TaskPatch) -> Result<Vec<TaskId>, StoreError>;
}
