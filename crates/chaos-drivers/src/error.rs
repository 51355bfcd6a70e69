use thiserror::Error;

/// Pure, side-effect-free validation failure (`spec.md §4.1`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid parameter: {reason}")]
pub struct InvalidParameter {
    pub reason: String,
}

/// Result of an `execute`/`clear` call that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionFailure {
    pub reason: String,
    pub retryable: bool,
}

impl ActionFailure {
    pub fn retryable(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            retryable: true,
        }
    }

    pub fn non_retryable(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            retryable: false,
        }
    }
}

impl std::fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (retryable={})", self.reason, self.retryable)
    }
}

impl std::error::Error for ActionFailure {}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("no driver registered for service {service:?}")]
    UnknownService { service: String },
}
