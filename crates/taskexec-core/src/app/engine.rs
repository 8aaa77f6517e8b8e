//! Engine - 実行コアの公開 API
//!
//! プロセス起動時に 1 つ構築し、呼び出し側にハンドルとして渡す。
//! グローバルなプールやカウンタは持たない。

use std::sync::Arc;

use tracing::info;

use super::config::EngineConfig;
use super::executor::TaskExecutor;
use super::metrics::{Metrics, MetricsSnapshot};
use super::recovery::{RecoveryReport, RecoveryScanner};
use super::worker_pool::WorkerPool;
use crate::domain::{EngineError, TaskId};
use crate::ports::{EventSink, TaskStore, Work};

pub struct Engine {
    store: Arc<dyn TaskStore>,
    pool: WorkerPool,
    recovery: RecoveryScanner,
    metrics: Arc<Metrics>,
    config: EngineConfig,
}

impl Engine {
    pub(crate) fn start(
        store: Arc<dyn TaskStore>,
        work: Arc<dyn Work>,
        events: Arc<dyn EventSink>,
        config: EngineConfig,
    ) -> Self {
        let metrics = Arc::new(Metrics::new());
        let executor = TaskExecutor::new(
            Arc::clone(&store),
            work,
            Arc::clone(&events),
            Arc::clone(&metrics),
            &config,
        );
        let pool = WorkerPool::spawn(config.pool_size, Arc::new(executor));
        let recovery = RecoveryScanner::new(Arc::clone(&store), events);

        info!(
            pool_size = config.pool_size,
            max_retries = config.max_retries,
            "execution engine started"
        );
        Self {
            store,
            pool,
            recovery,
            metrics,
            config,
        }
    }

    /// Queue `task_id` for execution. Returns immediately.
    ///
    /// Rejected until [`Engine::run_recovery`] has been called, so recovered
    /// tasks are always queued ahead of new ones. Callers must not submit the
    /// same identifier again while it is in flight.
    pub fn submit(&self, task_id: TaskId) -> Result<(), EngineError> {
        if !self.recovery.has_run() {
            return Err(EngineError::RecoveryPending(task_id));
        }
        self.pool.submit(task_id)
    }

    /// Reconcile tasks left non-terminal by a previous process. Call once at
    /// startup; external submissions are accepted only afterwards.
    pub async fn run_recovery(&self) -> RecoveryReport {
        self.recovery.run(&self.pool).await
    }

    /// Stop accepting work and wait for queued and in-flight executions.
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
        info!(metrics = ?self.metrics.snapshot(), "execution engine stopped");
    }

    /// Wait until no submission is queued or executing.
    pub async fn wait_idle(&self) {
        self.pool.wait_idle().await;
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pool_size(&self) -> usize {
        self.pool.size()
    }
}
