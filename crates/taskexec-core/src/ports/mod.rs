//! Ports - 抽象化レイヤー
//!
//! 各 trait は外部の協調者（タスクストア、実際の仕事、時刻、観測基盤）への
//! インターフェースで、実装の詳細を隠蔽します。

pub mod clock;
pub mod event_sink;
pub mod task_store;
pub mod work;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_sink::EventSink;
pub use self::task_store::TaskStore;
pub use self::work::Work;
