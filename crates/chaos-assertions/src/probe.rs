//! An [`Observation`] is one snapshot of external state polled by a probe;
//! a [`ConditionProbe`] knows how to fetch a batch of them and say which
//! ones satisfy an assertion's `expect`/`parameters`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use chaos_model::{Assertion, Value};

#[derive(Debug, Clone)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub matches: bool,
    pub evidence: BTreeMap<String, Value>,
}

#[async_trait]
pub trait ConditionProbe: Send + Sync {
    /// Fetches the current batch of observations relevant to `assertion`.
    /// Read-only — `spec.md §4.2` forbids evaluators from injecting chaos.
    async fn poll(&self, assertion: &Assertion) -> Result<Vec<Observation>, String>;
}

/// Picks the earliest-timestamped matching observation
/// (`spec.md §4.2` tie-break rule).
pub fn earliest_match(observations: &[Observation]) -> Option<&Observation> {
    observations
        .iter()
        .filter(|o| o.matches)
        .min_by_key(|o| o.timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(ts_secs: i64, matches: bool) -> Observation {
        Observation {
            timestamp: DateTime::from_timestamp(ts_secs, 0).unwrap(),
            matches,
            evidence: BTreeMap::new(),
        }
    }

    #[test]
    fn picks_earliest_among_multiple_matches() {
        let observations = vec![obs(30, true), obs(10, true), obs(20, false)];
        let picked = earliest_match(&observations).unwrap();
        assert_eq!(picked.timestamp.timestamp(), 10);
    }

    #[test]
    fn none_when_nothing_matches() {
        let observations = vec![obs(10, false)];
        assert!(earliest_match(&observations).is_none());
    }
}
