//! Rollback Controller (C6, `spec.md §4.4`).

use chrono::Utc;
use tokio::time::Instant;
use tracing::warn;

use chaos_drivers::ActionDriver;
use chaos_model::{Action, RollbackSpec};
use chaos_record::{ActionResult, RollbackResult};
use chaos_resilience::CancellationToken;

use crate::context::EngineContext;
use crate::ids::new_correlation_id;
use crate::phase_runner::action_timeout;

/// Runs every action in `rollback.actions`, in declaration order, best
/// effort: a failing cleanup action is recorded but never stops the rest
/// from attempting to run (`spec.md §4.4` — rollback exists to minimize
/// blast radius, not to be itself gated on success). Always runs against a
/// fresh cancellation scope since the scenario-level token that triggered
/// the rollback may already be cut.
///
/// `rollback.timeout` (default 10m) bounds the whole sequence, the same
/// way a phase deadline bounds a phase; within that budget, each action
/// gets its own fresh deadline off the same per-service `action_timeout`
/// regular actions use (`spec.md §4.4`'s "each under a bounded deadline
/// (default 30s)" is `action_timeout_default`'s own default, not the
/// overall `rollback.timeout`).
pub async fn run_rollback(rollback: &RollbackSpec, ctx: &EngineContext) -> RollbackResult {
    let cancel = CancellationToken::new();
    let overall_deadline = Instant::now() + ctx.config.rollback.timeout;

    let mut actions = Vec::with_capacity(rollback.actions.len());
    for action in &rollback.actions {
        let deadline = (Instant::now() + action_timeout(ctx, &action.service)).min(overall_deadline);
        actions.push(run_cleanup_action(action, deadline, &cancel, ctx).await);
    }

    RollbackResult { actions }
}

async fn run_cleanup_action(
    action: &Action,
    deadline: Instant,
    cancel: &CancellationToken,
    ctx: &EngineContext,
) -> ActionResult {
    let start_time = Utc::now();
    let correlation_id = new_correlation_id(&action.service, &action.kind);

    let outcome = match ctx.drivers.get(&action.service) {
        Ok(driver) => driver.execute(action, deadline, &correlation_id, cancel).await,
        Err(err) => Err(chaos_drivers::ActionFailure::non_retryable(err.to_string())),
    };

    if let Err(failure) = &outcome {
        warn!(service = %action.service, kind = %action.kind, reason = %failure.reason, "rollback action failed");
    }

    ActionResult {
        service: action.service.clone(),
        kind: action.kind.clone(),
        start_time,
        end_time: Utc::now(),
        success: outcome.is_ok(),
        error: outcome.err().map(|f| f.reason),
        correlation_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn empty_rollback_spec_produces_no_actions() {
        let ctx = test_context(vec![], vec![]);
        let result = run_rollback(&RollbackSpec::default(), &ctx).await;
        assert!(result.actions.is_empty());
        assert!(result.all_succeeded());
    }

    #[tokio::test]
    async fn a_failing_cleanup_action_does_not_stop_the_rest() {
        let ctx = test_context(
            vec![
                ("svc-A", StubDriver::always_fail("boom", true)),
                ("svc-B", StubDriver::always_ok()),
            ],
            vec![],
        );
        let rollback = RollbackSpec {
            on_failure: true,
            actions: vec![
                Action { service: "svc-A".into(), kind: "reconnect".into(), parameters: BTreeMap::new() },
                Action { service: "svc-B".into(), kind: "unfreeze".into(), parameters: BTreeMap::new() },
            ],
        };
        let result = run_rollback(&rollback, &ctx).await;

        assert_eq!(result.actions.len(), 2, "both cleanup actions must run");
        assert!(!result.all_succeeded());
        assert_eq!(result.failed_action_kinds(), vec!["svc-A/reconnect".to_string()]);
    }

    #[tokio::test]
    async fn each_rollback_action_gets_its_own_deadline_not_the_overall_rollback_timeout() {
        let recorder = DeadlineRecordingDriver::new();
        let mut ctx = test_context(vec![("svc-A", recorder.clone() as _)], vec![]);
        let mut cfg = (*ctx.config).clone();
        cfg.action_timeout_default = Duration::from_millis(30);
        cfg.rollback.timeout = Duration::from_secs(600);
        ctx.config = Arc::new(cfg);

        let rollback = RollbackSpec {
            on_failure: true,
            actions: vec![Action { service: "svc-A".into(), kind: "reconnect".into(), parameters: BTreeMap::new() }],
        };
        let before = Instant::now();
        run_rollback(&rollback, &ctx).await;

        let deadlines = recorder.deadlines();
        assert_eq!(deadlines.len(), 1);
        assert!(
            deadlines[0] < before + Duration::from_secs(1),
            "action deadline must come from action_timeout_default (30ms), not the 600s rollback.timeout"
        );
    }
}
