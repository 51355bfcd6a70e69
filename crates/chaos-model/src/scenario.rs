//! Immutable in-memory representation of a validated scenario (C1).
//!
//! The YAML parsing/schema-validation stage lives upstream of this crate
//! (`spec.md §1`); what lands here is already-parsed and is re-checked only
//! for the structural invariants the engine itself depends on
//! (`ScenarioError` exists for that defense-in-depth pass, not for surfacing
//! authoring mistakes to a human).

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::Value;

/// A scenario tag used in `success_criteria`, e.g. `"latency-sla"`.
pub type Tag = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub api_version: String,
    pub name: String,
    pub description: String,
    pub version: String,
    #[serde(with = "humantime_duration")]
    pub duration: Duration,
    #[serde(with = "humantime_duration")]
    pub timeout: Duration,
    #[serde(default)]
    pub variables: BTreeMap<String, Value>,
    pub phases: Vec<Phase>,
    #[serde(default)]
    pub rollback: RollbackSpec,
    #[serde(default)]
    pub success_criteria: HashSet<Tag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    #[serde(with = "humantime_duration")]
    pub duration: Duration,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub parallel_actions: Vec<ParallelAction>,
    #[serde(default)]
    pub assertions: Vec<Assertion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub service: String,
    pub kind: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelAction {
    #[serde(flatten)]
    pub action: Action,
    #[serde(with = "humantime_duration", default)]
    pub delay: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assertion {
    pub kind: String,
    pub expect: String,
    #[serde(with = "humantime_duration")]
    pub within: Duration,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RollbackSpec {
    #[serde(default)]
    pub on_failure: bool,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Structural problems caught by the engine's own defense-in-depth check
/// (`spec.md §3` invariants). The upstream schema validator is expected to
/// catch these first; this is a belt-and-suspenders pass, not the primary
/// validation surface.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("scenario timeout ({timeout_secs}s) is shorter than duration ({duration_secs}s)")]
    TimeoutShorterThanDuration {
        timeout_secs: u64,
        duration_secs: u64,
    },
    #[error("sum of phase durations ({sum_secs}s) exceeds scenario duration ({duration_secs}s)")]
    PhaseDurationsExceedScenario { sum_secs: u64, duration_secs: u64 },
    #[error("phase name {name:?} is not unique within the scenario")]
    DuplicatePhaseName { name: String },
    #[error("phase {name:?} has zero duration")]
    ZeroDurationPhase { name: String },
}

impl Scenario {
    /// Re-checks the invariants from `spec.md §3`. The upstream validator is
    /// the primary gate; this exists so the engine never silently runs a
    /// scenario whose invariants it depends on (deadline clamping, phase
    /// uniqueness for lookups) without having confirmed them itself.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.timeout < self.duration {
            return Err(ScenarioError::TimeoutShorterThanDuration {
                timeout_secs: self.timeout.as_secs(),
                duration_secs: self.duration.as_secs(),
            });
        }

        let sum: Duration = self.phases.iter().map(|p| p.duration).sum();
        if sum > self.duration {
            return Err(ScenarioError::PhaseDurationsExceedScenario {
                sum_secs: sum.as_secs(),
                duration_secs: self.duration.as_secs(),
            });
        }

        let mut seen = HashSet::with_capacity(self.phases.len());
        for phase in &self.phases {
            if phase.duration.is_zero() {
                return Err(ScenarioError::ZeroDurationPhase {
                    name: phase.name.clone(),
                });
            }
            if !seen.insert(phase.name.as_str()) {
                return Err(ScenarioError::DuplicatePhaseName {
                    name: phase.name.clone(),
                });
            }
        }

        Ok(())
    }
}

/// (De)serializes `Duration` from the `{N}{s|m|h}` integer-suffix form used
/// by the scenario document (`spec.md §6`).
mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("{}s", d.as_secs()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<Duration, String> {
        let raw = raw.trim();
        let (digits, unit) = raw.split_at(
            raw.find(|c: char| !c.is_ascii_digit())
                .ok_or_else(|| format!("duration {raw:?} has no unit suffix"))?,
        );
        let n: u64 = digits
            .parse()
            .map_err(|_| format!("duration {raw:?} has a non-integer magnitude"))?;
        let secs = match unit {
            "s" => n,
            "m" => n * 60,
            "h" => n * 3600,
            other => return Err(format!("duration {raw:?} has unknown unit {other:?}")),
        };
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_phase(name: &str, secs: u64) -> Phase {
        Phase {
            name: name.to_string(),
            duration: Duration::from_secs(secs),
            actions: vec![],
            parallel_actions: vec![],
            assertions: vec![],
        }
    }

    fn minimal_scenario(phases: Vec<Phase>) -> Scenario {
        Scenario {
            api_version: "chaos.trading/v1".to_string(),
            name: "test".to_string(),
            description: String::new(),
            version: "1".to_string(),
            duration: Duration::from_secs(60),
            timeout: Duration::from_secs(120),
            variables: BTreeMap::new(),
            phases,
            rollback: RollbackSpec::default(),
            success_criteria: HashSet::new(),
        }
    }

    #[test]
    fn zero_phases_is_valid() {
        assert!(minimal_scenario(vec![]).validate().is_ok());
    }

    #[test]
    fn rejects_timeout_shorter_than_duration() {
        let mut s = minimal_scenario(vec![]);
        s.timeout = Duration::from_secs(10);
        s.duration = Duration::from_secs(60);
        assert_eq!(
            s.validate(),
            Err(ScenarioError::TimeoutShorterThanDuration {
                timeout_secs: 10,
                duration_secs: 60
            })
        );
    }

    #[test]
    fn rejects_phase_duration_overflow() {
        let s = minimal_scenario(vec![minimal_phase("a", 40), minimal_phase("b", 40)]);
        assert!(matches!(
            s.validate(),
            Err(ScenarioError::PhaseDurationsExceedScenario { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_phase_names() {
        let s = minimal_scenario(vec![minimal_phase("a", 10), minimal_phase("a", 10)]);
        assert_eq!(
            s.validate(),
            Err(ScenarioError::DuplicatePhaseName {
                name: "a".to_string()
            })
        );
    }

    #[test]
    fn parses_duration_suffixes() {
        assert_eq!(
            humantime_duration::parse("90s").unwrap(),
            Duration::from_secs(90)
        );
        assert_eq!(
            humantime_duration::parse("2m").unwrap(),
            Duration::from_secs(120)
        );
        assert_eq!(
            humantime_duration::parse("1h").unwrap(),
            Duration::from_secs(3600)
        );
        assert!(humantime_duration::parse("1x").is_err());
    }

    /// The engine receives an already-parsed `Scenario` (`spec.md §1` —
    /// YAML parsing is upstream), but the type still has to round-trip
    /// through the wire format real callers send (`spec.md §6`).
    #[test]
    fn deserializes_from_the_yaml_wire_format() {
        let yaml = r#"
api_version: chaos.trading/v1
name: exchange-disconnect
description: Drops the primary exchange connection mid-session
version: "1"
duration: 5m
timeout: 10m
variables: {}
phases:
  - name: disconnect
    duration: 30s
    actions:
      - service: exchange
        kind: disconnect
        parameters: {}
    parallel_actions: []
    assertions:
      - kind: system_health
        expect: degraded
        within: 10s
        parameters: {}
rollback:
  on_failure: true
  actions:
    - service: exchange
      kind: reconnect
      parameters: {}
success_criteria: []
"#;
        let scenario: Scenario = serde_yaml::from_str(yaml).expect("valid scenario document");
        assert_eq!(scenario.name, "exchange-disconnect");
        assert_eq!(scenario.duration, Duration::from_secs(300));
        assert_eq!(scenario.timeout, Duration::from_secs(600));
        assert_eq!(scenario.phases.len(), 1);
        assert_eq!(scenario.phases[0].assertions[0].within, Duration::from_secs(10));
        assert!(scenario.validate().is_ok());
    }
}
