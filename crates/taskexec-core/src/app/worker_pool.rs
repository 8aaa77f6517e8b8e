//! WorkerPool - 固定数のワーカーで TaskExecutor を回す
//!
//! - 投入は unbounded な FIFO キュー（submit はブロックしない）
//! - 同時実行数はワーカー数 N を超えない
//! - shutdown はキューを閉じ、積まれている分を流し切ってから全ワーカーを待つ
//! - 再投入（retry）は executor ではなく worker loop が行う

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::executor::{ExecutionStep, TaskExecutor};
use crate::domain::{EngineError, TaskId};

/// State shared by the pool handle and its workers.
struct PoolShared {
    /// `None` once shutdown has started.
    sender: StdMutex<Option<mpsc::UnboundedSender<TaskId>>>,

    /// Workers take turns waiting on the single receiver.
    receiver: Mutex<mpsc::UnboundedReceiver<TaskId>>,

    /// Submissions queued or executing.
    outstanding: AtomicUsize,

    idle: Notify,
}

impl PoolShared {
    fn submit(&self, task_id: TaskId) -> Result<(), EngineError> {
        let sender = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        let Some(tx) = sender.as_ref() else {
            return Err(EngineError::PoolClosed(task_id));
        };

        self.outstanding.fetch_add(1, Ordering::SeqCst);
        if tx.send(task_id).is_err() {
            self.finish_one();
            return Err(EngineError::PoolClosed(task_id));
        }
        Ok(())
    }

    fn close(&self) -> bool {
        let mut sender = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        sender.take().is_some()
    }

    fn is_closed(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
    }

    fn finish_one(&self) {
        if self.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    async fn next(&self) -> Option<TaskId> {
        self.receiver.lock().await.recv().await
    }
}

/// Worker pool handle.
/// - `submit()` でタスクを積む
/// - `shutdown()` で新規受付を止め、全ワーカーの終了を待つ
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    joins: Mutex<Vec<JoinHandle<()>>>,
    size: usize,
}

impl WorkerPool {
    /// Spawn `size` workers. Must be called inside a tokio runtime.
    pub fn spawn(size: usize, executor: Arc<TaskExecutor>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(PoolShared {
            sender: StdMutex::new(Some(tx)),
            receiver: Mutex::new(rx),
            outstanding: AtomicUsize::new(0),
            idle: Notify::new(),
        });

        let joins = (0..size)
            .map(|worker_id| {
                let shared = Arc::clone(&shared);
                let executor = Arc::clone(&executor);
                tokio::spawn(async move {
                    worker_loop(worker_id, shared, executor).await;
                })
            })
            .collect();

        debug!(size, "worker pool started");
        Self {
            shared,
            joins: Mutex::new(joins),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Enqueue `task_id`. Never blocks.
    pub fn submit(&self, task_id: TaskId) -> Result<(), EngineError> {
        self.shared.submit(task_id)
    }

    /// Submissions currently queued or executing.
    pub fn outstanding(&self) -> usize {
        self.shared.outstanding.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Wait until nothing is queued or executing.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Stop accepting work, let workers drain what is already queued, and
    /// wait for all of them. In-flight executions are never interrupted.
    pub async fn shutdown(&self) {
        if self.shared.close() {
            info!(outstanding = self.outstanding(), "worker pool shutting down");
        }

        let joins: Vec<JoinHandle<()>> = self.joins.lock().await.drain(..).collect();
        for join in joins {
            if let Err(e) = join.await {
                error!(error = %e, "worker terminated abnormally");
            }
        }
    }
}

async fn worker_loop(worker_id: usize, shared: Arc<PoolShared>, executor: Arc<TaskExecutor>) {
    // recv() は送信側が閉じられ、かつキューが空のときに None を返す
    while let Some(task_id) = shared.next().await {
        match executor.execute(task_id).await {
            Ok(ExecutionStep::Resubmit) => {
                if let Err(e) = shared.submit(task_id) {
                    // stays PENDING in the store; startup recovery picks it up
                    warn!(worker_id, task_id = %task_id, error = %e, "retry not resubmitted");
                }
            }
            Ok(ExecutionStep::Settled(status)) => {
                debug!(worker_id, task_id = %task_id, status = %status, "task settled");
            }
            Ok(ExecutionStep::Skipped) => {}
            Err(e) => {
                error!(worker_id, task_id = %task_id, error = %e, "attempt abandoned");
            }
        }
        shared.finish_one();
    }
    debug!(worker_id, "worker stopped");
}
