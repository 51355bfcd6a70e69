//! The Assertion Evaluator capability set (`spec.md §4.2`).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::Instant;
use tracing::debug;

use chaos_model::Assertion;
use chaos_record::AssertionResult;
use chaos_resilience::CancellationToken;

use crate::probe::{earliest_match, ConditionProbe};

#[async_trait]
pub trait AssertionEvaluator: Send + Sync {
    async fn evaluate(
        &self,
        assertion: &Assertion,
        deadline: Instant,
        cancel: &CancellationToken,
        poll_interval: Duration,
    ) -> AssertionResult;
}

/// Generic poll-until-passed-or-deadline-or-canceled evaluator, parametric
/// over a kind-specific [`ConditionProbe`]. Every concrete evaluator in
/// `crate::kinds` is this loop wired to a different probe.
pub struct PollingEvaluator<P: ConditionProbe> {
    kind: String,
    probe: Arc<P>,
}

impl<P: ConditionProbe> PollingEvaluator<P> {
    pub fn new(kind: impl Into<String>, probe: Arc<P>) -> Self {
        Self {
            kind: kind.into(),
            probe,
        }
    }
}

#[async_trait]
impl<P: ConditionProbe> AssertionEvaluator for PollingEvaluator<P> {
    async fn evaluate(
        &self,
        assertion: &Assertion,
        deadline: Instant,
        cancel: &CancellationToken,
        poll_interval: Duration,
    ) -> AssertionResult {
        let start = Instant::now();
        // The first poll always happens regardless of the deadline, so a
        // `within=0` assertion still gets exactly one observation
        // (`spec.md §8` boundary behavior) before timing out.
        loop {
            if cancel.is_cancelled() {
                return result(&self.kind, false, "canceled", start);
            }

            match self.probe.poll(assertion).await {
                Ok(observations) => {
                    if let Some(observation) = earliest_match(&observations) {
                        let mut r = result(&self.kind, true, "predicate_met", start);
                        r.evidence = observation.evidence.clone();
                        r.timestamp = observation.timestamp;
                        return r;
                    }
                }
                Err(err) => debug!(kind = %self.kind, error = %err, "probe poll failed, will retry on next tick"),
            }

            if Instant::now() >= deadline {
                return result(&self.kind, false, "timeout", start);
            }

            let wait_until = (Instant::now() + poll_interval).min(deadline);
            match cancel.race(tokio::time::sleep_until(wait_until)).await {
                Some(()) => {}
                None => return result(&self.kind, false, "canceled", start),
            }
        }
    }
}

fn result(kind: &str, passed: bool, message: &str, start: Instant) -> AssertionResult {
    AssertionResult {
        kind: kind.to_string(),
        passed,
        message: message.to_string(),
        timestamp: Utc::now(),
        evidence: Default::default(),
        elapsed: start.elapsed(),
    }
}
