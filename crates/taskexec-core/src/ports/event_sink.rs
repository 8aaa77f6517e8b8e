//! EventSink port - 観測イベントの記録

use crate::domain::ExecutionEvent;

/// EventSink は ExecutionEvent を受け取る
///
/// emit は実行ユニットのホットパスから同期的に呼ばれるので、
/// 実装はブロックしないこと。
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ExecutionEvent);
}
