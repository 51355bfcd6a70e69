//! Error kinds from `spec.md §7`. These are folded into the
//! [`chaos_record::ExecutionRecord`] by the Phase Runner / Supervisor —
//! nothing here crosses the public boundary as a raw exception.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("at capacity")]
    CapacityExceeded,
    #[error("action failed: {reason} (retryable={retryable})")]
    ActionFailed { reason: String, retryable: bool },
    #[error("assertion failed: {reason}")]
    AssertionFailed { reason: AssertionFailureReason },
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("canceled")]
    Canceled,
    #[error("scenario is invalid: {0}")]
    InvalidScenario(String),
    #[error("no execution registered with id {execution_id:?}")]
    UnknownExecution { execution_id: String },
    #[error("execution {execution_id:?} has already finished")]
    AlreadyFinished { execution_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionFailureReason {
    PredicateUnmet,
    Timeout,
    Canceled,
}

impl std::fmt::Display for AssertionFailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssertionFailureReason::PredicateUnmet => write!(f, "predicate_unmet"),
            AssertionFailureReason::Timeout => write!(f, "timeout"),
            AssertionFailureReason::Canceled => write!(f, "canceled"),
        }
    }
}
