//! Registry keyed by assertion `kind` (`spec.md §9`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::evaluator::AssertionEvaluator;

#[derive(Debug, Error)]
#[error("no evaluator registered for assertion kind {kind:?}")]
pub struct UnknownAssertionKind {
    pub kind: String,
}

#[derive(Default)]
pub struct EvaluatorRegistry {
    evaluators: HashMap<String, Arc<dyn AssertionEvaluator>>,
    /// Poll cadence override per kind (`spec.md §4.2`: "default 5s;
    /// overridable per kind in configuration").
    poll_intervals: HashMap<String, Duration>,
    default_poll_interval: Duration,
}

impl EvaluatorRegistry {
    pub fn new(default_poll_interval: Duration) -> Self {
        Self {
            evaluators: HashMap::new(),
            poll_intervals: HashMap::new(),
            default_poll_interval,
        }
    }

    pub fn register(&mut self, kind: impl Into<String>, evaluator: Arc<dyn AssertionEvaluator>) {
        self.evaluators.insert(kind.into(), evaluator);
    }

    pub fn set_poll_interval(&mut self, kind: impl Into<String>, interval: Duration) {
        self.poll_intervals.insert(kind.into(), interval);
    }

    pub fn get(&self, kind: &str) -> Result<Arc<dyn AssertionEvaluator>, UnknownAssertionKind> {
        self.evaluators
            .get(kind)
            .cloned()
            .ok_or_else(|| UnknownAssertionKind { kind: kind.to_string() })
    }

    pub fn poll_interval(&self, kind: &str) -> Duration {
        self.poll_intervals
            .get(kind)
            .copied()
            .unwrap_or(self.default_poll_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_default_poll_interval() {
        let registry = EvaluatorRegistry::new(Duration::from_secs(5));
        assert_eq!(registry.poll_interval("system_health"), Duration::from_secs(5));
    }

    #[test]
    fn per_kind_override_wins() {
        let mut registry = EvaluatorRegistry::new(Duration::from_secs(5));
        registry.set_poll_interval("risk_alert", Duration::from_secs(1));
        assert_eq!(registry.poll_interval("risk_alert"), Duration::from_secs(1));
        assert_eq!(registry.poll_interval("system_health"), Duration::from_secs(5));
    }
}
