//! The Service Action Driver capability set (`spec.md §4.1`).

use async_trait::async_trait;
use tokio::time::Instant;

use chaos_model::Action;
use chaos_resilience::CancellationToken;

use crate::error::{ActionFailure, InvalidParameter};

/// Translates an abstract [`Action`] into a remote chaos-injection call and
/// reports success/failure. One implementation per target service.
#[async_trait]
pub trait ActionDriver: Send + Sync {
    /// Pure, side-effect-free parameter check. Called by the upstream
    /// validator and re-called by the engine immediately before `execute`
    /// as defense-in-depth (`spec.md §4.1`).
    fn validate(&self, action: &Action) -> Result<(), InvalidParameter>;

    /// Performs the remote call. Must respect `deadline` — returns
    /// `Failed{reason="deadline exceeded", retryable=true}` on expiry — and
    /// must be idempotent under retry by carrying `correlation_id`.
    async fn execute(
        &self,
        action: &Action,
        deadline: Instant,
        correlation_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ActionFailure>;

    /// Reverses the effect of a prior `execute`. Must tolerate "nothing to
    /// clear" (used by the Rollback Controller).
    async fn clear(&self, correlation_id: &str) -> Result<(), ActionFailure>;
}

/// Races a future against both `deadline` and `cancel`, collapsing either
/// into the `Failed{reason="deadline exceeded", retryable=true}` shape
/// drivers are required to return on expiry.
pub async fn run_with_deadline<F, T>(
    deadline: Instant,
    cancel: &CancellationToken,
    fut: F,
) -> Result<T, ActionFailure>
where
    F: std::future::Future<Output = Result<T, ActionFailure>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ActionFailure::retryable("canceled")),
        _ = tokio::time::sleep_until(deadline) => Err(ActionFailure::retryable("deadline exceeded")),
        result = fut => result,
    }
}
