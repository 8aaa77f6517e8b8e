//! Work port - タスクの中身（ペイロード）の抽象化
//!
//! 実行ユニットは Work の結果を「正常終了」か「障害」かでしか区別しません。
//! テストでは決定的な Work を、デモでは乱数で失敗する Work を差し込みます。

use async_trait::async_trait;

use crate::domain::{Outcome, TaskRecord};

/// Work は 1 回の試行を実行して Outcome を返す
///
/// # 使用例
/// ```ignore
/// let always_fail = |_: &TaskRecord| Outcome::failure("boom");
/// let engine = EngineBuilder::new(store).work(always_fail).build()?;
/// ```
#[async_trait]
pub trait Work: Send + Sync {
    async fn perform(&self, task: &TaskRecord) -> Outcome;
}

#[async_trait]
impl<F> Work for F
where
    F: Fn(&TaskRecord) -> Outcome + Send + Sync,
{
    async fn perform(&self, task: &TaskRecord) -> Outcome {
        self(task)
    }
}
