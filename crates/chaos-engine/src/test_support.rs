//! Stub drivers/evaluators for exercising the Phase Runner and Supervisor
//! without a real HTTP endpoint, in the style of `crates::drivers::registry`
//! and `crates::assertions::registry`'s own inline test doubles.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::Instant;

use chaos_assertions::{AssertionEvaluator, EvaluatorRegistry};
use chaos_config::EngineConfig;
use chaos_drivers::{ActionFailure, DriverRegistry};
use chaos_model::{Action, Assertion};
use chaos_record::AssertionResult;
use chaos_repository::InMemoryRepository;
use chaos_resilience::CancellationToken;

use crate::context::EngineContext;

pub struct StubDriver {
    fail: Option<(String, bool)>,
    delay: Duration,
}

impl StubDriver {
    pub fn always_ok() -> Arc<dyn chaos_drivers::ActionDriver> {
        Arc::new(Self { fail: None, delay: Duration::ZERO })
    }

    pub fn always_fail(reason: &str, retryable: bool) -> Arc<dyn chaos_drivers::ActionDriver> {
        Arc::new(Self {
            fail: Some((reason.to_string(), retryable)),
            delay: Duration::ZERO,
        })
    }

    /// Succeeds only after `delay` has elapsed, for exercising timing that
    /// depends on how long a sequential action takes before the phase's
    /// concurrent step starts.
    pub fn slow_ok(delay: Duration) -> Arc<dyn chaos_drivers::ActionDriver> {
        Arc::new(Self { fail: None, delay })
    }
}

#[async_trait]
impl chaos_drivers::ActionDriver for StubDriver {
    fn validate(&self, _action: &Action) -> Result<(), chaos_drivers::InvalidParameter> {
        Ok(())
    }

    async fn execute(
        &self,
        _action: &Action,
        _deadline: Instant,
        _correlation_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<(), ActionFailure> {
        if self.delay > Duration::ZERO {
            tokio::time::sleep(self.delay).await;
        }
        match &self.fail {
            None => Ok(()),
            Some((reason, retryable)) => Err(ActionFailure {
                reason: reason.clone(),
                retryable: *retryable,
            }),
        }
    }

    async fn clear(&self, _correlation_id: &str) -> Result<(), ActionFailure> {
        Ok(())
    }
}

/// Records the deadline each `execute` call was given, for asserting on
/// how a caller computed it rather than on the call's outcome.
pub struct DeadlineRecordingDriver {
    deadlines: std::sync::Mutex<Vec<Instant>>,
}

impl DeadlineRecordingDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { deadlines: std::sync::Mutex::new(Vec::new()) })
    }

    pub fn deadlines(&self) -> Vec<Instant> {
        self.deadlines.lock().unwrap().clone()
    }
}

#[async_trait]
impl chaos_drivers::ActionDriver for DeadlineRecordingDriver {
    fn validate(&self, _action: &Action) -> Result<(), chaos_drivers::InvalidParameter> {
        Ok(())
    }

    async fn execute(
        &self,
        _action: &Action,
        deadline: Instant,
        _correlation_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<(), ActionFailure> {
        self.deadlines.lock().unwrap().push(deadline);
        Ok(())
    }

    async fn clear(&self, _correlation_id: &str) -> Result<(), ActionFailure> {
        Ok(())
    }
}

pub struct StubEvaluator {
    passes: bool,
}

impl StubEvaluator {
    pub fn always_pass() -> Arc<dyn AssertionEvaluator> {
        Arc::new(Self { passes: true })
    }

    pub fn never_pass() -> Arc<dyn AssertionEvaluator> {
        Arc::new(Self { passes: false })
    }
}

#[async_trait]
impl AssertionEvaluator for StubEvaluator {
    async fn evaluate(
        &self,
        assertion: &Assertion,
        deadline: Instant,
        cancel: &CancellationToken,
        poll_interval: Duration,
    ) -> AssertionResult {
        let start = Instant::now();
        if self.passes {
            return AssertionResult {
                kind: assertion.kind.clone(),
                passed: true,
                message: "predicate_met".to_string(),
                timestamp: Utc::now(),
                evidence: Default::default(),
                elapsed: start.elapsed(),
            };
        }
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

pub fn test_context(
    drivers: Vec<(&str, Arc<dyn chaos_drivers::ActionDriver>)>,
    evaluators: Vec<(&str, Arc<dyn AssertionEvaluator>)>,
) -> EngineContext {
    let mut driver_registry = DriverRegistry::new();
    for (service, driver) in drivers {
        driver_registry.register(service, driver);
    }

    let mut evaluator_registry = EvaluatorRegistry::new(Duration::from_millis(10));
    for (kind, evaluator) in evaluators {
        evaluator_registry.register(kind, evaluator);
    }

    EngineContext {
        drivers: Arc::new(driver_registry),
        evaluators: Arc::new(evaluator_registry),
        config: Arc::new(EngineConfig::default()),
        repository: Arc::new(InMemoryRepository::new()),
    }
}
