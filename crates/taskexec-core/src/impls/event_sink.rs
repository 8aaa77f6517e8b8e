//! EventSink implementations.
//!
//! - TracingEventSink: 構造化ログとして出力（デフォルト）
//! - RecordingEventSink: 発行されたイベントを保持（テスト用）

use std::sync::Mutex;

use tracing::{info, warn};

use crate::domain::ExecutionEvent;
use crate::ports::EventSink;

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::Started { task_id, attempt } => {
                info!(task_id = %task_id, attempt, "task started");
            }
            ExecutionEvent::Completed { task_id, attempt } => {
                info!(task_id = %task_id, attempt, "task completed");
            }
            ExecutionEvent::Retrying {
                task_id,
                attempt,
                limit,
                reason,
            } => {
                warn!(task_id = %task_id, attempt, limit, reason = %reason, "task failed, retrying");
            }
            ExecutionEvent::PermanentlyFailed {
                task_id,
                attempts,
                reason,
            } => {
                warn!(task_id = %task_id, attempts, reason = %reason, "task permanently failed");
            }
            ExecutionEvent::Recovered { task_id } => {
                info!(task_id = %task_id, "task recovered from previous run");
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<ExecutionEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Names of the recorded events, in emission order.
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(ExecutionEvent::name).collect()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: &ExecutionEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
    }
}
