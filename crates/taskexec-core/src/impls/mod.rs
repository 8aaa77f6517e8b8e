//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryTaskStore**: デモとテスト用の正本
//! - **SimulatedWork**: 固定シードの乱数で失敗するダミーの仕事
//! - **TracingEventSink / RecordingEventSink**
//!
//! 本番用の TaskStore（PostgreSQL など）はこのクレートの外で実装します。

pub mod event_sink;
pub mod inmem_store;
pub mod simulated_work;

pub use self::event_sink::{RecordingEventSink, TracingEventSink};
pub use self::inmem_store::{InMemoryTaskStore, Transition};
pub use self::simulated_work::SimulatedWork;
