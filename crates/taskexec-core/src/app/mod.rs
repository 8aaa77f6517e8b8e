//! App - アプリケーション層
//!
//! ports を組み合わせて実行コアを組み立てます。
//!
//! # 主要コンポーネント
//! - **EngineBuilder / Engine**: 構築と公開 API（submit / run_recovery / shutdown / metrics）
//! - **TaskExecutor**: 1 試行分の状態機械（RUNNING → COMPLETED | PENDING | FAILED）
//! - **WorkerPool**: 固定数ワーカー + FIFO キュー、retry の再投入
//! - **RecoveryScanner**: 起動時に未完了タスクを回収
//! - **Metrics**: completed / retried / failed カウンタ
//! - **config**: 環境変数からの設定

pub mod builder;
pub mod config;
pub mod engine;
pub mod executor;
pub mod metrics;
pub mod recovery;
pub mod worker_pool;

pub use self::builder::{BuildError, EngineBuilder};
pub use self::config::{ConfigError, EngineConfig, SimulationConfig};
pub use self::engine::Engine;
pub use self::executor::{ExecutionStep, TaskExecutor};
pub use self::metrics::{Metrics, MetricsSnapshot};
pub use self::recovery::{RecoveryReport, RecoveryScanner};
pub use self::worker_pool::WorkerPool;
