//! Execution Supervisor (C7, `spec.md §4.5`).
//!
//! Owns one [`ExecutionRecord`] end to end: runs phases in order, decides
//! the terminal status, triggers rollback, and persists the finished
//! record. Never touches another execution's state — the Execution
//! Registry (`registry.rs`) is what fans this out across concurrent runs.

use chrono::Utc;
use tokio::time::Instant;
use tracing::{error, info};

use chaos_model::Scenario;
use chaos_record::{ExecutionRecord, ExecutionStatus, TerminationReason};
use chaos_resilience::CancellationToken;

use crate::context::EngineContext;
use crate::phase_runner::run_phase;
use crate::rollback::run_rollback;

/// Runs `scenario` to completion or cancellation, returning the finished,
/// persisted [`ExecutionRecord`]. `execution_id` is minted by the caller
/// (the Execution Registry) so the id used as the registry's lookup key is
/// always the same value stamped on the record it returns (`spec.md §4.6`
/// Registry entry `{execution_id, ..., record}`).
pub async fn execute_scenario(
    execution_id: String,
    scenario: Scenario,
    cancel: CancellationToken,
    ctx: EngineContext,
) -> ExecutionRecord {
    let mut record = ExecutionRecord::new(execution_id.clone(), scenario.clone(), Utc::now());
    record.status = ExecutionStatus::Running;

    info!(execution_id = %execution_id, scenario = %scenario.name, "execution started");

    let scenario_deadline = Instant::now() + scenario.timeout;
    let mut termination_reason = None;

    for phase in &scenario.phases {
        if cancel.is_cancelled() {
            termination_reason = Some(TerminationReason::ExternalStop);
            break;
        }
        if Instant::now() >= scenario_deadline {
            termination_reason = Some(TerminationReason::ScenarioTimeout);
            break;
        }

        let phase_deadline = (Instant::now() + phase.duration).min(scenario_deadline);
        let phase_result = run_phase(phase, phase_deadline, &cancel, &ctx).await;
        let phase_failed = !phase_result.success;
        let failure = phase_result.error.clone();
        let phase_name = phase_result.phase_name.clone();
        record.phases.push(phase_result);

        if phase_failed {
            termination_reason = Some(TerminationReason::PhaseFailed {
                phase: phase_name,
                error: failure.unwrap_or_default(),
            });
            break;
        }
    }

    if termination_reason.is_none() && cancel.is_cancelled() {
        termination_reason = Some(TerminationReason::ExternalStop);
    }

    let mut status = match &termination_reason {
        None => ExecutionStatus::Completed,
        Some(TerminationReason::ExternalStop) => ExecutionStatus::Stopped,
        Some(TerminationReason::ScenarioTimeout) => ExecutionStatus::TimedOut,
        Some(TerminationReason::PhaseFailed { .. }) => ExecutionStatus::Failed,
        Some(TerminationReason::RollbackPartial { .. }) => ExecutionStatus::Failed,
    };

    if should_roll_back(&scenario, status, &ctx) {
        info!(execution_id = %execution_id, "running rollback");
        let rollback_result = run_rollback(&scenario.rollback, &ctx).await;
        if !rollback_result.all_succeeded() {
            termination_reason = Some(TerminationReason::RollbackPartial {
                failed_actions: rollback_result.failed_action_kinds(),
            });
            status = ExecutionStatus::Failed;
        }
        record.rollback_result = Some(rollback_result);
    }

    record.status = status;
    record.termination_reason = termination_reason;
    record.end_time = Some(Utc::now());

    if let Err(err) = ctx.repository.save(&record).await {
        error!(execution_id = %execution_id, %err, "failed to persist execution record");
    }

    info!(execution_id = %execution_id, status = ?record.status, "execution finished");
    record
}

/// Decides `spec.md §13` Open Question: a scenario failure always honors
/// `rollback.on_failure`; an external stop only triggers rollback when the
/// deployment has opted into `rollback.aggressive_cleanup`, since a plain
/// stop is an operator decision to halt, not necessarily to also unwind.
fn should_roll_back(scenario: &Scenario, status: ExecutionStatus, ctx: &EngineContext) -> bool {
    if !scenario.rollback.on_failure || !ctx.config.rollback.enabled || scenario.rollback.actions.is_empty() {
        return false;
    }
    match status {
        ExecutionStatus::Failed | ExecutionStatus::TimedOut => true,
        ExecutionStatus::Stopped => ctx.config.rollback.aggressive_cleanup,
        ExecutionStatus::Completed | ExecutionStatus::Pending | ExecutionStatus::Running => false,
    }
}
