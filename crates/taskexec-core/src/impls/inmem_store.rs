//! In-memory task store.
//!
//! Reference implementation of [`TaskStore`] used by the demo binary and the
//! tests. It also keeps a transition log per task so the sequence of
//! statuses a task went through can be inspected afterwards.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{StoreError, TaskId, TaskPatch, TaskRecord, TaskStatus};
use crate::ports::{Clock, SystemClock, TaskStore};

/// One persisted `(status, retry_count)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub status: TaskStatus,
    pub retry_count: u32,
}

impl Transition {
    pub fn new(status: TaskStatus, retry_count: u32) -> Self {
        Self {
            status,
            retry_count,
        }
    }

    fn of(record: &TaskRecord) -> Self {
        Self::new(record.status, record.retry_count)
    }
}

#[derive(Default)]
struct InMemoryStoreState {
    /// All task records (single source of truth).
    records: HashMap<TaskId, TaskRecord>,

    /// Every persisted state of every task, oldest first.
    history: HashMap<TaskId, Vec<Transition>>,
}

impl InMemoryStoreState {
    fn put(&mut self, record: TaskRecord) {
        self.history
            .entry(record.id)
            .or_default()
            .push(Transition::of(&record));
        self.records.insert(record.id, record);
    }

    fn patch(&mut self, id: TaskId, patch: &TaskPatch) -> Option<TaskRecord> {
        let record = self.records.get_mut(&id)?;
        record.apply(patch);
        let updated = record.clone();
        self.history
            .entry(id)
            .or_default()
            .push(Transition::of(&updated));
        Some(updated)
    }
}

pub struct InMemoryTaskStore {
    state: Mutex<InMemoryStoreState>,
    clock: Arc<dyn Clock>,
    available: AtomicBool,
    failing_writes: AtomicU32,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(InMemoryStoreState::default()),
            clock,
            available: AtomicBool::new(true),
            failing_writes: AtomicU32::new(0),
        }
    }

    /// Store a record as-is, e.g. one left `RUNNING` by a crashed process.
    pub async fn insert(&self, record: TaskRecord) {
        self.state.lock().await.put(record);
    }

    /// Create a record named `name` already in `status`.
    pub async fn seed(&self, name: &str, status: TaskStatus) -> TaskRecord {
        let now = self.clock.now();
        let record = TaskRecord::new(TaskId::generate_at(now), name, now).with_status(status);
        self.insert(record.clone()).await;
        record
    }

    pub async fn remove(&self, id: TaskId) -> Option<TaskRecord> {
        self.state.lock().await.records.remove(&id)
    }

    /// Persisted states of `id`, oldest first.
    pub async fn history(&self, id: TaskId) -> Vec<Transition> {
        let state = self.state.lock().await;
        state.history.get(&id).cloned().unwrap_or_default()
    }

    /// Simulate an outage: while unavailable every operation fails.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make the next `n` write operations fail.
    pub fn fail_next_writes(&self, n: u32) {
        self.failing_writes.store(n, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store is offline".to_string()))
        }
    }

    fn check_write(&self) -> Result<(), StoreError> {
        self.check_available()?;
        let injected = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::Unavailable("injected write failure".to_string()));
        }
        Ok(())
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn get(&self, id: TaskId) -> Result<Option<TaskRecord>, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state.records.get(&id).cloned())
    }

    async fn list_by_status(&self, statuses: &[TaskStatus]) -> Result<Vec<TaskRecord>, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;
        let mut records: Vec<TaskRecord> = state
            .records
            .values()
            .filter(|r| statuses.contains(&r.status))
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.created_at, r.id));
        Ok(records)
    }

    async fn create(&self, name: &str) -> Result<TaskRecord, StoreError> {
        self.check_write()?;
        let now = self.clock.now();
        let record = TaskRecord::new(TaskId::generate_at(now), name, now);
        self.state.lock().await.put(record.clone());
        Ok(record)
    }

    async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Option<TaskRecord>, StoreError> {
        self.check_write()?;
        let mut state = self.state.lock().await;
        Ok(state.patch(id, &patch))
    }

    async fn update_many(&self, ids: &[TaskId], patch: TaskPatch) -> Result<Vec<TaskId>, StoreError> {
        self.check_write()?;
        let mut state = self.state.lock().await;
        let updated = ids
            .iter()
            .copied()
            .filter(|id| state.patch(*id, &patch).is_some())
            .collect();
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn create_then_get() {
        let store = InMemoryTaskStore::new();
        let created = store.create("test task").await.unwrap();

        assert_eq!(created.status, TaskStatus::Pending);
        assert_eq!(created.retry_count, 0);

        let fetched = store.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn create_uses_injected_clock() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let store = InMemoryTaskStore::with_clock(Arc::new(FixedClock::new(at)));
        let created = store.create("t").await.unwrap();
        assert_eq!(created.created_at, at);
        assert_eq!(created.id.as_ulid().timestamp_ms(), at.timestamp_millis() as u64);
    }

    #[tokio::test]
    async fn update_missing_record_returns_none() {
        let store = InMemoryTaskStore::new();
        let ghost = TaskId::from_ulid(ulid::Ulid::new());
        let result = store
            .update(ghost, TaskPatch::status(TaskStatus::Running))
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(store.get(ghost).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_by_status_filters() {
        let store = InMemoryTaskStore::new();
        let pending = store.create("a").await.unwrap();
        let running = store.seed("b", TaskStatus::Running).await;
        store.seed("c", TaskStatus::Completed).await;

        let listed = store.list_by_status(&TaskStatus::NON_TERMINAL).await.unwrap();
        let ids: Vec<TaskId> = listed.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&pending.id));
        assert!(ids.contains(&running.id));

        let all = store.list_by_status(&TaskStatus::ALL).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn update_many_skips_missing_records() {
        let store = InMemoryTaskStore::new();
        let a = store.seed("a", TaskStatus::Running).await;
        let ghost = TaskId::from_ulid(ulid::Ulid::new());

        let updated = store
            .update_many(&[a.id, ghost], TaskPatch::status(TaskStatus::Pending))
            .await
            .unwrap();
        assert_eq!(updated, vec![a.id]);
        assert_eq!(
            store.get(a.id).await.unwrap().unwrap().status,
            TaskStatus::Pending
        );
    }

    #[tokio::test]
    async fn history_records_every_write() {
        let store = InMemoryTaskStore::new();
        let t = store.create("t").await.unwrap();
        store
            .update(t.id, TaskPatch::status(TaskStatus::Running))
            .await
            .unwrap();
        store
            .update(t.id, TaskPatch::status(TaskStatus::Pending).with_retry_count(1))
            .await
            .unwrap();

        assert_eq!(
            store.history(t.id).await,
            vec![
                Transition::new(TaskStatus::Pending, 0),
                Transition::new(TaskStatus::Running, 0),
                Transition::new(TaskStatus::Pending, 1),
            ]
        );
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_operation() {
        let store = InMemoryTaskStore::new();
        let t = store.create("t").await.unwrap();
        store.set_available(false);

        assert!(matches!(store.get(t.id).await, Err(StoreError::Unavailable(_))));
        assert!(store.list_by_status(&TaskStatus::ALL).await.is_err());
        assert!(store.create("u").await.is_err());

        store.set_available(true);
        assert!(store.get(t.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn injected_write_failures_are_consumed() {
        let store = InMemoryTaskStore::new();
        let t = store.create("t").await.unwrap();
        store.fail_next_writes(2);

        let patch = TaskPatch::status(TaskStatus::Running);
        assert!(store.update(t.id, patch).await.is_err());
        assert!(store.update(t.id, patch).await.is_err());
        assert!(store.update(t.id, patch).await.unwrap().is_some());
    }
}
