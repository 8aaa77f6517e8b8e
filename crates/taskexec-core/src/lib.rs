//! taskexec-core
//!
//! Task execution core: runs named units of work on a bounded worker pool,
//! retries transient faults a bounded number of times, and recovers work left
//! in flight by a previous process.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task, state, outcome, decision, errors, events）
//! - **ports**: 抽象化レイヤー（TaskStore, Work, EventSink, Clock）
//! - **app**: アプリケーションロジック（Engine, TaskExecutor, WorkerPool, RecoveryScanner, Metrics）
//! - **impls**: 実装（InMemoryTaskStore, SimulatedWork, TracingEventSink など）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{Engine, EngineBuilder, EngineConfig, MetricsSnapshot, RecoveryReport};
pub use domain::{EngineError, Outcome, TaskId, TaskRecord, TaskStatus};
