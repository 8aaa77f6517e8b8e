//! Outcome of one work attempt.
//!
//! The engine does not interpret what the work produced. It only needs to
//! know whether the attempt returned normally or raised a fault.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Success,
    Fault { reason: String },
}

impl Outcome {
    pub fn success() -> Self {
        Outcome::Success
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Outcome::Fault {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Success => None,
            Outcome::Fault { reason } => Some(reason),
        }
    }
}
