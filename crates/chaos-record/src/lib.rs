//! Execution record types (C4, `spec.md §3`).
//!
//! An [`ExecutionRecord`] is append-only for the lifetime of the run it
//! describes and is owned exclusively by the Supervisor that is building
//! it (`spec.md §3` "Ownership"). Once `finalize` sets a terminal `status`
//! the record becomes immutable and is freely shareable — callers of the
//! registry always receive a cloned snapshot, never a live handle into a
//! running execution.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chaos_model::{Scenario, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Stopped,
    TimedOut,
}

/// Why an execution reached a terminal, non-`Completed` state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TerminationReason {
    PhaseFailed { phase: String, error: String },
    ScenarioTimeout,
    ExternalStop,
    RollbackPartial { failed_actions: Vec<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub execution_id: String,
    pub scenario: Scenario,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: ExecutionStatus,
    pub phases: Vec<PhaseResult>,
    pub rollback_result: Option<RollbackResult>,
    pub termination_reason: Option<TerminationReason>,
}

impl ExecutionRecord {
    pub fn new(execution_id: String, scenario: Scenario, start_time: DateTime<Utc>) -> Self {
        Self {
            execution_id,
            scenario,
            start_time,
            end_time: None,
            status: ExecutionStatus::Pending,
            phases: Vec::new(),
            rollback_result: None,
            termination_reason: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.status, ExecutionStatus::Pending | ExecutionStatus::Running)
    }

    /// Lightweight view used by registry listing operations
    /// (`spec.md §11` supplemented feature), distinct from the full record
    /// so listing traffic never pays for the evidence payload.
    pub fn summary(&self) -> ExecutionSummary {
        ExecutionSummary {
            execution_id: self.execution_id.clone(),
            scenario_name: self.scenario.name.clone(),
            status: self.status,
            start_time: self.start_time,
            end_time: self.end_time,
            phases_completed: self.phases.len(),
            phases_total: self.scenario.phases.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub execution_id: String,
    pub scenario_name: String,
    pub status: ExecutionStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub phases_completed: usize,
    pub phases_total: usize,
}

/// Aggregate view over every execution the registry currently holds
/// (`spec.md §11` supplemented feature), grounded on the shape of
/// `council::workflow::WorkflowStatistics` in the teacher repo.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RegistryStatistics {
    pub total: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub stopped: usize,
    pub timed_out: usize,
}

impl RegistryStatistics {
    pub fn from_statuses(statuses: impl Iterator<Item = ExecutionStatus>) -> Self {
        let mut stats = Self::default();
        for status in statuses {
            stats.total += 1;
            match status {
                ExecutionStatus::Pending | ExecutionStatus::Running => stats.running += 1,
                ExecutionStatus::Completed => stats.completed += 1,
                ExecutionStatus::Failed => stats.failed += 1,
                ExecutionStatus::Stopped => stats.stopped += 1,
                ExecutionStatus::TimedOut => stats.timed_out += 1,
            }
        }
        stats
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseResult {
    pub phase_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub success: bool,
    pub error: Option<String>,
    pub actions: Vec<ActionResult>,
    pub assertions: Vec<AssertionResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub service: String,
    pub kind: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub success: bool,
    pub error: Option<String>,
    pub correlation_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionResult {
    pub kind: String,
    pub passed: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub evidence: BTreeMap<String, Value>,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackResult {
    pub actions: Vec<ActionResult>,
}

impl RollbackResult {
    pub fn all_succeeded(&self) -> bool {
        self.actions.iter().all(|a| a.success)
    }

    pub fn failed_action_kinds(&self) -> Vec<String> {
        self.actions
            .iter()
            .filter(|a| !a.success)
            .map(|a| format!("{}/{}", a.service, a.kind))
            .collect()
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Map;

    #[test]
    fn summary_reflects_partial_execution() {
        let scenario = test_scenario(3);
        let mut record = ExecutionRecord::new("exec-1".into(), scenario, Utc::now());
        record.phases.push(PhaseResult {
            phase_name: "phase-1".into(),
            start_time: Utc::now(),
            end_time: Utc::now(),
            success: true,
            error: None,
            actions: vec![],
            assertions: vec![],
        });
        let summary = record.summary();
        assert_eq!(summary.phases_completed, 1);
        assert_eq!(summary.phases_total, 3);
    }

    #[test]
    fn rollback_result_reports_failed_kinds() {
        let result = RollbackResult {
            actions: vec![
                ActionResult {
                    service: "exchange".into(),
                    kind: "reconnect".into(),
                    start_time: Utc::now(),
                    end_time: Utc::now(),
                    success: true,
                    error: None,
                    correlation_id: "c1".into(),
                },
                ActionResult {
                    service: "risk".into(),
                    kind: "unfreeze".into(),
                    start_time: Utc::now(),
                    end_time: Utc::now(),
                    success: false,
                    error: Some("timeout".into()),
                    correlation_id: "c2".into(),
                },
            ],
        };
        assert!(!result.all_succeeded());
        assert_eq!(result.failed_action_kinds(), vec!["risk/unfreeze".to_string()]);
    }

    #[test]
    fn registry_statistics_tally_by_status() {
        let stats = RegistryStatistics::from_statuses(
            vec![
                ExecutionStatus::Running,
                ExecutionStatus::Completed,
                ExecutionStatus::Failed,
                ExecutionStatus::Completed,
            ]
            .into_iter(),
        );
        assert_eq!(stats.total, 4);
        assert_eq!(stats.running, 1);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.failed, 1);
    }

    fn test_scenario(phase_count: usize) -> Scenario {
        use chaos_model::{Phase, RollbackSpec};
        use std::time::Duration as StdDuration;
        Scenario {
            api_version: "chaos.trading/v1".into(),
            name: "s".into(),
            description: String::new(),
            version: "1".into(),
            duration: StdDuration::from_secs(60 * phase_count as u64),
            timeout: StdDuration::from_secs(120 * phase_count as u64),
            variables: Map::new(),
            phases: (0..phase_count)
                .map(|i| Phase {
                    name: format!("phase-{i}"),
                    duration: StdDuration::from_secs(10),
                    actions: vec![],
                    parallel_actions: vec![],
                    assertions: vec![],
                })
                .collect(),
            rollback: RollbackSpec::default(),
            success_criteria: Default::default(),
        }
    }
}
