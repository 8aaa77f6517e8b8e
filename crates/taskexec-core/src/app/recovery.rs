//! RecoveryScanner - 前回プロセスが残した未完了タスクの回収
//!
//! # フロー
//! 1. TaskStore::list_by_status(RUNNING, PENDING) で未完了を取得
//! 2. TaskStore::update_many() でまとめて PENDING に戻す
//! 3. WorkerPool に再投入
//!
//! RUNNING のまま残ったタスクはどこまで進んだか分からないので最初からやり直す
//! （この経路だけ at-least-once）。
//! 失敗してもログに残すだけで、プロセスの起動は止めない。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info, warn};

use super::worker_pool::WorkerPool;
use crate::domain::{ExecutionEvent, StoreError, TaskId, TaskPatch, TaskStatus};
use crate::ports::{EventSink, TaskStore};

/// Result of a recovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryReport {
    Recovered { reset: usize, resubmitted: usize },

    /// Recovery already ran for this engine; nothing was touched.
    AlreadyRan,

    /// The scan or reset failed. Startup continues regardless.
    Failed { reason: String },
}

impl RecoveryReport {
    pub fn resubmitted(&self) -> usize {
        match self {
            RecoveryReport::Recovered { resubmitted, .. } => *resubmitted,
            _ => 0,
        }
    }
}

pub struct RecoveryScanner {
    store: Arc<dyn TaskStore>,
    events: Arc<dyn EventSink>,
    ran: AtomicBool,
}

impl RecoveryScanner {
    pub fn new(store: Arc<dyn TaskStore>, events: Arc<dyn EventSink>) -> Self {
        Self {
            store,
            events,
            ran: AtomicBool::new(false),
        }
    }

    pub fn has_run(&self) -> bool {
        self.ran.load(Ordering::SeqCst)
    }

    /// Run once. Later calls return [`RecoveryReport::AlreadyRan`].
    pub async fn run(&self, pool: &WorkerPool) -> RecoveryReport {
        if self.ran.swap(true, Ordering::SeqCst) {
            return RecoveryReport::AlreadyRan;
        }

        let reset = match self.reset_stranded().await {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "startup recovery failed, continuing without it");
                return RecoveryReport::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let mut resubmitted = 0;
        for task_id in &reset {
            self.events
                .emit(&ExecutionEvent::Recovered { task_id: *task_id });
            match pool.submit(*task_id) {
                Ok(()) => resubmitted += 1,
                Err(e) => warn!(task_id = %task_id, error = %e, "recovered task not resubmitted"),
            }
        }

        info!(reset = reset.len(), resubmitted, "startup recovery finished");
        RecoveryReport::Recovered {
            reset: reset.len(),
            resubmitted,
        }
    }

    async fn reset_stranded(&self) -> Result<Vec<TaskId>, StoreError> {
        let stranded = self.store.list_by_status(&TaskStatus::NON_TERMINAL).await?;
        if stranded.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<TaskId> = stranded.iter().map(|r| r.id).collect();
        self.store
            .update_many(&ids, TaskPatch::status(TaskStatus::Pending))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{EngineConfig, Metrics, TaskExecutor};
    use crate::domain::{Outcome, TaskRecord};
    use crate::impls::{InMemoryTaskStore, RecordingEventSink, Transition};
    use crate::ports::Work;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    /// Blocks every attempt until the test releases permits.
    struct Gate(Arc<Semaphore>);

    #[async_trait::async_trait]
    impl Work for Gate {
        async fn perform(&self, _task: &TaskRecord) -> Outcome {
            match self.0.acquire().await {
                Ok(permit) => {
                    permit.forget();
                    Outcome::success()
                }
                Err(_) => Outcome::failure("gate closed"),
            }
        }
    }

    struct Setup {
        store: Arc<InMemoryTaskStore>,
        events: Arc<RecordingEventSink>,
        scanner: RecoveryScanner,
        pool: WorkerPool,
    }

    fn setup(work: Arc<dyn Work>) -> Setup {
        let store = Arc::new(InMemoryTaskStore::new());
        let events = Arc::new(RecordingEventSink::new());
        let executor = TaskExecutor::new(
            store.clone(),
            work,
            events.clone(),
            Arc::new(Metrics::new()),
            &EngineConfig::default(),
        );
        let pool = WorkerPool::spawn(2, Arc::new(executor));
        let scanner = RecoveryScanner::new(store.clone(), events.clone());
        Setup {
            store,
            events,
            scanner,
            pool,
        }
    }

    #[tokio::test]
    async fn empty_store_is_a_no_op() {
        let s = setup(Arc::new(|_: &TaskRecord| Outcome::success()));
        s.store.seed("done", TaskStatus::Completed).await;
        s.store.seed("dead", TaskStatus::Failed).await;

        let report = s.scanner.run(&s.pool).await;
        assert_eq!(
            report,
            RecoveryReport::Recovered {
                reset: 0,
                resubmitted: 0
            }
        );
        assert_eq!(s.pool.outstanding(), 0);
        assert!(s.events.events().is_empty());
        s.pool.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stranded_tasks_are_reset_and_resubmitted_once() {
        let gate = Arc::new(Semaphore::new(0));
        let s = setup(Arc::new(Gate(gate.clone())));
        let t3 = s.store.seed("T3", TaskStatus::Running).await;
        let t4 = s.store.seed("T4", TaskStatus::Running).await;
        let queued = s.store.seed("queued", TaskStatus::Pending).await;

        let first = s.scanner.run(&s.pool).await;
        assert_eq!(
            first,
            RecoveryReport::Recovered {
                reset: 3,
                resubmitted: 3
            }
        );

        // second run before either completes
        let second = s.scanner.run(&s.pool).await;
        assert_eq!(second, RecoveryReport::AlreadyRan);

        for id in [t3.id, t4.id] {
            let history = s.store.history(id).await;
            assert_eq!(
                &history[..2],
                &[
                    Transition::new(TaskStatus::Running, 0),
                    Transition::new(TaskStatus::Pending, 0),
                ]
            );
        }
        let recovered = s
            .events
            .events()
            .iter()
            .filter(|e| e.name() == "recovered")
            .count();
        assert_eq!(recovered, 3);

        gate.add_permits(3);
        tokio::time::timeout(Duration::from_secs(5), s.pool.wait_idle())
            .await
            .unwrap();
        for id in [t3.id, t4.id, queued.id] {
            assert_eq!(
                s.store.get(id).await.unwrap().unwrap().status,
                TaskStatus::Completed
            );
        }
        s.pool.shutdown().await;
    }

    #[tokio::test]
    async fn store_outage_is_reported_not_raised() {
        let s = setup(Arc::new(|_: &TaskRecord| Outcome::success()));
        s.store.seed("T3", TaskStatus::Running).await;
        s.store.set_available(false);

        let report = s.scanner.run(&s.pool).await;
        assert!(matches!(report, RecoveryReport::Failed { .. }));
        assert!(s.scanner.has_run());
        assert_eq!(s.pool.outstanding(), 0);
        s.pool.shutdown().await;
    }

    #[tokio::test]
    async fn retry_count_survives_recovery() {
        let gate = Arc::new(Semaphore::new(0));
        let s = setup(Arc::new(Gate(gate.clone())));
        let record = s.store.seed("half-done", TaskStatus::Running).await;
        s.store.insert(record.clone().with_retry_count(1)).await;

        s.scanner.run(&s.pool).await;
        let after = s.store.get(record.id).await.unwrap().unwrap();
        assert_eq!(after.retry_count, 1);

        gate.add_permits(1);
        tokio::time::timeout(Duration::from_secs(5), s.pool.wait_idle())
            .await
            .unwrap();
        s.pool.shutdown().await;
    }
}
