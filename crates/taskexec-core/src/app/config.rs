//! Engine and simulation configuration, loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::DEFAULT_MAX_RETRIES;

pub const DEFAULT_POOL_SIZE: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Execution core configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Number of worker slots (max concurrent executions).
    pub pool_size: usize,

    /// Retries after the first failed attempt.
    pub max_retries: u32,

    /// How many times a single store call is tried before the attempt is
    /// abandoned and left for startup recovery.
    pub store_write_attempts: u32,

    /// Fixed delay between store call retries.
    pub store_retry_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            store_write_attempts: 3,
            store_retry_delay: Duration::from_millis(50),
        }
    }
}

impl EngineConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables (all optional):
    /// - `TASKEXEC_POOL_SIZE`: worker slots (default: 4)
    /// - `TASKEXEC_MAX_RETRIES`: retries per task (default: 2)
    /// - `TASKEXEC_STORE_WRITE_ATTEMPTS`: tries per store call (default: 3)
    /// - `TASKEXEC_STORE_RETRY_DELAY_MS`: delay between store tries (default: 50)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            pool_size: env_or("TASKEXEC_POOL_SIZE", defaults.pool_size)?,
            max_retries: env_or("TASKEXEC_MAX_RETRIES", defaults.max_retries)?,
            store_write_attempts: env_or(
                "TASKEXEC_STORE_WRITE_ATTEMPTS",
                defaults.store_write_attempts,
            )?,
            store_retry_delay: Duration::from_millis(env_or(
                "TASKEXEC_STORE_RETRY_DELAY_MS",
                defaults.store_retry_delay.as_millis() as u64,
            )?),
        })
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_store_write_attempts(mut self, attempts: u32) -> Self {
        self.store_write_attempts = attempts.max(1);
        self
    }

    pub fn with_store_retry_delay(mut self, delay: Duration) -> Self {
        self.store_retry_delay = delay;
        self
    }
}

/// Parameters of [`SimulatedWork`](crate::impls::SimulatedWork).
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub work_duration: Duration,
    pub failure_probability: f64,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            work_duration: Duration::from_millis(200),
            failure_probability: 0.5,
            seed: 42,
        }
    }
}

impl SimulationConfig {
    /// Environment variables (all optional):
    /// - `TASKEXEC_WORK_MILLIS` (default: 200)
    /// - `TASKEXEC_FAILURE_PROBABILITY`: 0.0..=1.0 (default: 0.5)
    /// - `TASKEXEC_SEED` (default: 42)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let failure_probability: f64 =
            env_or("TASKEXEC_FAILURE_PROBABILITY", defaults.failure_probability)?;
        if !(0.0..=1.0).contains(&failure_probability) {
            return Err(ConfigError::Invalid {
                var: "TASKEXEC_FAILURE_PROBABILITY",
                value: failure_probability.to_string(),
                reason: "must be within 0.0..=1.0".to_string(),
            });
        }

        Ok(Self {
            work_duration: Duration::from_millis(env_or(
                "TASKEXEC_WORK_MILLIS",
                defaults.work_duration.as_millis() as u64,
            )?),
            failure_probability,
            seed: env_or("TASKEXEC_SEED", defaults.seed)?,
        })
    }
}

fn env_or<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) => parse_value(var, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
