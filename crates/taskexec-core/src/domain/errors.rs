//! Errors - エラー型と分類
//!
//! - StoreError: 永続化層（TaskStore）の障害
//! - EngineError: Engine の公開 API が返すエラー
//! - ExecutionError: 実行ユニットが握りつぶせなかった障害（worker loop がログに残す）

use thiserror::Error;

use super::TaskId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task store unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("worker pool is shut down; {0} was not accepted")]
    PoolClosed(TaskId),

    #[error("startup recovery has not run yet; {0} was not accepted")]
    RecoveryPending(TaskId),
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("persisting state of {task_id} failed: {source}")]
    Store {
        task_id: TaskId,
        #[source]
        source: StoreError,
    },
}

impl ExecutionError {
    pub fn task_id(&self) -> TaskId {
        match self {
            ExecutionError::Store { task_id, .. } => *task_id,
        }
    }
}
