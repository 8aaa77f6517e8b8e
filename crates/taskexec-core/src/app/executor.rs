//! TaskExecutor - 1 タスク 1 試行の状態機械
//!
//! # フロー
//! 1. TaskStore::get() でレコード取得（なければ何もしない）
//! 2. RUNNING にして保存、started を発行
//! 3. Work 実行 → Outcome
//! 4. 障害ならレコードを取り直す（古い値で retry_count を上書きしない、
//!    その間に終端へ移っていれば何もしない）
//! 5. RetryPolicy::decide() → Decision
//! 6. Decision を保存してカウンタ・イベントを更新
//!
//! 再投入は行わず `ExecutionStep::Resubmit` を返すだけ。
//! 実際の再投入は worker loop が担当する。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::config::EngineConfig;
use super::metrics::Metrics;
use crate::domain::{
    Decision, ExecutionError, ExecutionEvent, Outcome, RetryPolicy, StoreError, TaskId, TaskPatch,
    TaskRecord, TaskStatus,
};
use crate::ports::{EventSink, TaskStore, Work};

/// What the caller has to do after one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStep {
    /// The task reached a terminal status.
    Settled(TaskStatus),

    /// The attempt faulted with retries left. The task is `PENDING` again and
    /// must be resubmitted.
    Resubmit,

    /// Nothing to do: the record is gone or already terminal.
    Skipped,
}

pub struct TaskExecutor {
    store: Arc<dyn TaskStore>,
    work: Arc<dyn Work>,
    events: Arc<dyn EventSink>,
    metrics: Arc<Metrics>,
    policy: RetryPolicy,
    store_attempts: u32,
    store_retry_delay: Duration,
}

impl TaskExecutor {
    pub fn new(
        store: Arc<dyn TaskStore>,
        work: Arc<dyn Work>,
        events: Arc<dyn EventSink>,
        metrics: Arc<Metrics>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            store,
            work,
            events,
            metrics,
            policy: RetryPolicy::new(config.max_retries),
            store_attempts: config.store_write_attempts.max(1),
            store_retry_delay: config.store_retry_delay,
        }
    }

    /// Run one attempt of `task_id`.
    ///
    /// Work faults never surface here; they are turned into a retry or a
    /// `FAILED` record. The only error is a store that keeps failing, in which
    /// case the record keeps its last persisted status.
    pub async fn execute(&self, task_id: TaskId) -> Result<ExecutionStep, ExecutionError> {
        let Some(task) = self
            .store_call(task_id, "get", || self.store.get(task_id))
            .await?
        else {
            debug!(task_id = %task_id, "task no longer exists, skipping");
            return Ok(ExecutionStep::Skipped);
        };

        if task.status.is_terminal() {
            debug!(task_id = %task_id, status = %task.status, "task already terminal, skipping");
            return Ok(ExecutionStep::Skipped);
        }

        let running = TaskPatch::status(TaskStatus::Running);
        let Some(task) = self
            .store_call(task_id, "mark running", || self.store.update(task_id, running))
            .await?
        else {
            return Ok(ExecutionStep::Skipped);
        };

        let attempt = task.next_attempt();
        self.events
            .emit(&ExecutionEvent::Started { task_id, attempt });

        let outcome = self.perform(task.clone()).await;

        let current = if outcome.is_success() {
            task
        } else {
            // The record may have been touched while the work ran.
            match self
                .store_call(task_id, "reload", || self.store.get(task_id))
                .await?
            {
                Some(fresh) if fresh.status.is_terminal() => {
                    debug!(
                        task_id = %task_id,
                        status = %fresh.status,
                        "task settled elsewhere during attempt, skipping"
                    );
                    return Ok(ExecutionStep::Skipped);
                }
                Some(fresh) => fresh,
                None => {
                    debug!(task_id = %task_id, "task vanished during attempt, skipping");
                    return Ok(ExecutionStep::Skipped);
                }
            }
        };

        let decision = self.policy.decide(&outcome, current.retry_count);
        self.apply(task_id, attempt, decision, &outcome).await
    }

    async fn apply(
        &self,
        task_id: TaskId,
        attempt: u32,
        decision: Decision,
        outcome: &Outcome,
    ) -> Result<ExecutionStep, ExecutionError> {
        let reason = outcome.reason().unwrap_or_default().to_string();

        match decision {
            Decision::Complete => {
                let patch = TaskPatch::status(TaskStatus::Completed);
                if !self.persist(task_id, "mark completed", patch).await? {
                    return Ok(ExecutionStep::Skipped);
                }
                self.metrics.record_completed();
                self.events
                    .emit(&ExecutionEvent::Completed { task_id, attempt });
                Ok(ExecutionStep::Settled(TaskStatus::Completed))
            }
            Decision::Retry {
                attempt: retry,
                limit,
            } => {
                let patch = TaskPatch::status(TaskStatus::Pending).with_retry_count(retry);
                if !self.persist(task_id, "mark pending", patch).await? {
                    return Ok(ExecutionStep::Skipped);
                }
                self.events.emit(&ExecutionEvent::Retrying {
                    task_id,
                    attempt: retry,
                    limit,
                    reason,
                });
                self.metrics.record_retried();
                Ok(ExecutionStep::Resubmit)
            }
            Decision::MarkFailed { attempts } => {
                let patch = TaskPatch::status(TaskStatus::Failed).with_retry_count(attempts);
                if !self.persist(task_id, "mark failed", patch).await? {
                    return Ok(ExecutionStep::Skipped);
                }
                self.events.emit(&ExecutionEvent::PermanentlyFailed {
                    task_id,
                    attempts,
                    reason,
                });
                self.metrics.record_failed();
                Ok(ExecutionStep::Settled(TaskStatus::Failed))
            }
        }
    }

    /// Returns false when the record no longer exists.
    async fn persist(
        &self,
        task_id: TaskId,
        op: &'static str,
        patch: TaskPatch,
    ) -> Result<bool, ExecutionError> {
        let updated = self
            .store_call(task_id, op, || self.store.update(task_id, patch))
            .await?;
        Ok(updated.is_some())
    }

    /// Runs the work on its own tokio task so a panicking payload becomes a
    /// fault of this attempt instead of taking the worker down.
    async fn perform(&self, task: TaskRecord) -> Outcome {
        let work = Arc::clone(&self.work);
        match tokio::spawn(async move { work.perform(&task).await }).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => Outcome::failure("work panicked"),
            Err(e) => Outcome::failure(format!("work aborted: {e}")),
        }
    }

    async fn store_call<T, F, Fut>(
        &self,
        task_id: TaskId,
        op: &'static str,
        mut call: F,
    ) -> Result<T, ExecutionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut tries = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if tries < self.store_attempts => {
                    warn!(task_id = %task_id, op, tries, error = %e, "store call failed, retrying");
                    tokio::time::sleep(self.store_retry_delay).await;
                    tries += 1;
                }
                Err(source) => return Err(ExecutionError::Store { task_id, source }),
            }
        }
    }
}
