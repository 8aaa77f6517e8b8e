//! Decision model: what happens to a task after one attempt.
//!
//! Deciding is a pure function of `(outcome, retry_count, max_retries)`.
//! Persisting the decision and resubmitting the task are handled by the
//! execution unit and the worker loop.

use super::Outcome;

/// Default number of retries after the first failed attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// The next action to take for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The attempt succeeded: mark `COMPLETED`.
    Complete,

    /// The attempt failed but retries remain: mark `PENDING` with
    /// `retry_count = attempt` and resubmit.
    Retry { attempt: u32, limit: u32 },

    /// The attempt failed and retries are exhausted: mark `FAILED` with
    /// `retry_count = attempts`.
    MarkFailed { attempts: u32 },
}

/// Bounded retry policy. No backoff: a retry is re-queued immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Decide the next action.
    ///
    /// # Arguments
    /// * `outcome` - Outcome of the attempt that just finished.
    /// * `retry_count` - Failed attempts recorded *before* this one, read
    ///   fresh from the store.
    ///
    /// A task is attempted at most `max_retries + 1` times.
    pub fn decide(&self, outcome: &Outcome, retry_count: u32) -> Decision {
        if outcome.is_success() {
            return Decision::Complete;
        }

        let failed = retry_count.saturating_add(1);
        if failed <= self.max_retries {
            Decision::Retry {
                attempt: failed,
                limit: self.max_retries,
            }
        } else {
            Decision::MarkFailed { attempts: failed }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}
