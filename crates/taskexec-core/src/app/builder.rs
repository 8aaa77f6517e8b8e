//! EngineBuilder - エンジンの構築とワイヤリング
//!
//! # Fail-fast 設計
//! - build() 時に設定を検証し、不正なら BuildError を返す
//! - Work を指定しなかった場合はデフォルトの SimulatedWork を使う

use std::sync::Arc;

use super::config::{EngineConfig, SimulationConfig};
use super::engine::Engine;
use crate::impls::{SimulatedWork, TracingEventSink};
use crate::ports::{EventSink, TaskStore, Work};

/// BuildError はエンジン構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("pool_size must be at least 1")]
    EmptyPool,
}

/// EngineBuilder はエンジンを構築
///
/// # 使用例
/// ```ignore
/// let engine = EngineBuilder::new(store)
///     .config(EngineConfig::from_env()?)
///     .work(|_: &TaskRecord| Outcome::success())
///     .build()?;
/// engine.run_recovery().await;
/// ```
pub struct EngineBuilder {
    store: Arc<dyn TaskStore>,
    config: EngineConfig,
    work: Option<Arc<dyn Work>>,
    events: Arc<dyn EventSink>,
}

impl EngineBuilder {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self {
            store,
            config: EngineConfig::default(),
            work: None,
            events: Arc::new(TracingEventSink),
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn work<W: Work + 'static>(mut self, work: W) -> Self {
        self.work = Some(Arc::new(work));
        self
    }

    pub fn shared_work(mut self, work: Arc<dyn Work>) -> Self {
        self.work = Some(work);
        self
    }

    pub fn event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Validate and start the engine. Must be called inside a tokio runtime.
    pub fn build(self) -> Result<Engine, BuildError> {
        if self.config.pool_size == 0 {
            return Err(BuildError::EmptyPool);
        }
        let work = self.work.unwrap_or_else(|| {
            Arc::new(SimulatedWork::from_config(&SimulationConfig::default()))
        });
        Ok(Engine::start(self.store, work, self.events, self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Outcome, TaskRecord};
    use crate::impls::InMemoryTaskStore;

    #[tokio::test]
    async fn build_success() {
        let engine = EngineBuilder::new(Arc::new(InMemoryTaskStore::new()))
            .work(|_: &TaskRecord| Outcome::success())
            .build();
        assert!(engine.is_ok());
        engine.unwrap().shutdown().await;
    }

    #[tokio::test]
    async fn build_rejects_empty_pool() {
        let engine = EngineBuilder::new(Arc::new(InMemoryTaskStore::new()))
            .config(EngineConfig::default().with_pool_size(0))
            .build();
        assert!(matches!(engine, Err(BuildError::EmptyPool)));
    }

    #[tokio::test]
    async fn build_without_work_uses_simulation() {
        let engine = EngineBuilder::new(Arc::new(InMemoryTaskStore::new()))
            .build()
            .unwrap();
        assert_eq!(engine.pool_size(), 4);
        engine.shutdown().await;
    }
}
