//! SimulatedWork - 実際の仕事の代わりに使うダミーの Work
//!
//! 一定時間待ってから、固定確率で失敗します。
//! 乱数は固定シードの StdRng なので、同じシード・同じ投入順なら結果を再現できます。

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::app::config::SimulationConfig;
use crate::domain::{Outcome, TaskRecord};
use crate::ports::Work;

pub struct SimulatedWork {
    duration: Duration,
    failure_probability: f64,
    rng: Mutex<StdRng>,
}

impl SimulatedWork {
    pub fn new(duration: Duration, failure_probability: f64, seed: u64) -> Self {
        Self {
            duration,
            failure_probability: failure_probability.clamp(0.0, 1.0),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(
            config.work_duration,
            config.failure_probability,
            config.seed,
        )
    }

    fn roll_fault(&self) -> bool {
        // A poisoned lock only means another attempt panicked mid-roll; the
        // generator itself is still usable.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_bool(self.failure_probability)
    }
}

#[async_trait]
impl Work for SimulatedWork {
    async fn perform(&self, task: &TaskRecord) -> Outcome {
        tokio::time::sleep(self.duration).await;

        if self.roll_fault() {
            Outcome::failure(format!(
                "simulated transient failure on attempt {} of {}",
                task.next_attempt(),
                task.id
            ))
        } else {
            Outcome::success()
        }
    }
}
