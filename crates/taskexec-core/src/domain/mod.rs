//! Domain model (ids, records, status, outcomes, decisions, errors, events).

pub mod decision;
pub mod errors;
pub mod events;
pub mod ids;
pub mod outcome;
pub mod state;
pub mod task;

pub use self::decision::{DEFAULT_MAX_RETRIES, Decision, RetryPolicy};
pub use self::errors::{EngineError, ExecutionError, StoreError};
pub use self::events::ExecutionEvent;
pub use self::ids::TaskId;
pub use self::outcome::Outcome;
pub use self::state::TaskStatus;
pub use self::task::{TaskPatch, TaskRecord};
