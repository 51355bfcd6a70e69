//! Mock drivers and evaluators for end-to-end engine testing, standing in
//! for the real HTTP-backed implementations the way `integration-tests`'
//! own `mocks.rs` stands in for real databases and caches.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::Instant;

use chaos_assertions::AssertionEvaluator;
use chaos_drivers::{ActionDriver, ActionFailure, InvalidParameter};
use chaos_model::{Action, Assertion};
use chaos_record::AssertionResult;
use chaos_resilience::CancellationToken;

/// A driver that always succeeds and counts how many times it was called.
pub struct CountingDriver {
    pub calls: AtomicUsize,
}

impl CountingDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { calls: AtomicUsize::new(0) })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActionDriver for CountingDriver {
    fn validate(&self, _action: &Action) -> Result<(), InvalidParameter> {
        Ok(())
    }

    async fn execute(
        &self,
        _action: &Action,
        _deadline: Instant,
        _correlation_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<(), ActionFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear(&self, _correlation_id: &str) -> Result<(), ActionFailure> {
        Ok(())
    }
}

/// A driver whose `execute` always fails non-retryably, simulating a
/// chaos-injection call the target service rejected outright.
pub struct FailingDriver {
    pub reason: String,
}

impl FailingDriver {
    pub fn new(reason: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { reason: reason.into() })
    }
}

#[async_trait]
impl ActionDriver for FailingDriver {
    fn validate(&self, _action: &Action) -> Result<(), InvalidParameter> {
        Ok(())
    }

    async fn execute(
        &self,
        _action: &Action,
        _deadline: Instant,
        _correlation_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<(), ActionFailure> {
        Err(ActionFailure::non_retryable(self.reason.clone()))
    }

    async fn clear(&self, _correlation_id: &str) -> Result<(), ActionFailure> {
        Ok(())
    }
}

/// An evaluator that passes on its very first poll, standing in for a
/// target system that is already in the asserted state.
pub struct ImmediatePassEvaluator;

#[async_trait]
impl AssertionEvaluator for ImmediatePassEvaluator {
    async fn evaluate(
        &self,
        assertion: &Assertion,
        _deadline: Instant,
        _cancel: &CancellationToken,
        _poll_interval: Duration,
    ) -> AssertionResult {
        AssertionResult {
            kind: assertion.kind.clone(),
            passed: true,
            message: "predicate_met".to_string(),
            timestamp: Utc::now(),
            evidence: Default::default(),
            elapsed: Duration::ZERO,
        }
    }
}

/// An evaluator that never observes the asserted condition, so it always
/// runs out the clock to a timeout.
pub struct NeverPassEvaluator;

#[async_trait]
impl AssertionEvaluator for NeverPassEvaluator {
    async fn evaluate(
        &self,
        assertion: &Assertion,
        deadline: Instant,
        cancel: &CancellationToken,
        poll_interval: Duration,
    ) -> AssertionResult {
        let start = Instant::now();
        loop {
            if cancel.is_cancelled() {
                break;
            }
            if Instant::now() >= deadline {
                break;
            }
            let wait_until = (Instant::now() + poll_interval).min(deadline);
            if cancel.race(tokio::time::sleep_until(wait_until)).await.is_none() {
                break;
            }
        }
        AssertionResult {
            kind: assertion.kind.clone(),
            passed: false,
            message: "timeout".to_string(),
            timestamp: Utc::now(),
            evidence: Default::default(),
            elapsed: start.elapsed(),
        }
    }
}
