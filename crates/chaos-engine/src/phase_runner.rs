//! Phase Runner (C5, `spec.md §4.3`).

use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tokio::time::Instant;
use tracing::{info, warn};

use chaos_drivers::ActionDriver;
use chaos_model::{Action, ParallelAction, Phase};
use chaos_record::{ActionResult, AssertionResult, PhaseResult};
use chaos_resilience::CancellationToken;

use crate::context::EngineContext;
use crate::ids::new_correlation_id;

/// Runs one phase to completion. Every action launched is accounted for in
/// the returned [`PhaseResult`] before this function returns, and no task
/// it spawns outlives the call (`spec.md §4.3` invariants).
pub async fn run_phase(
    phase: &Phase,
    phase_deadline: Instant,
    cancel: &CancellationToken,
    ctx: &EngineContext,
) -> PhaseResult {
    let start_time = Utc::now();
    let phase_start_instant = Instant::now();
    let phase_cancel = cancel.child();

    let mut action_results = Vec::with_capacity(phase.actions.len());
    let mut fatal_error: Option<String> = None;

    // Step 2: sequential actions, strict declaration order.
    for action in &phase.actions {
        let deadline = action_deadline(phase_deadline, action_timeout(ctx, &action.service));
        let (result, failure) = run_action(action, deadline, &phase_cancel, ctx).await;
        action_results.push(result);
        if let Some(reason) = failure {
            warn!(phase = %phase.name, service = %action.service, kind = %action.kind, %reason, "sequential action failed, aborting phase");
            fatal_error = Some(reason);
            break;
        }
    }

    let (parallel_results, assertion_results) = if fatal_error.is_some() {
        (Vec::new(), Vec::new())
    } else {
        // Steps 3 and 4 run concurrently with each other; parallel action
        // failures are recorded but never abort the phase (`spec.md §4.3`
        // rationale: assertions are the oracle, not action success).
        let parallel_fut = run_parallel_actions(phase, phase_deadline, &phase_cancel, ctx);
        let assertions_fut = run_assertions(phase, phase_start_instant, phase_deadline, &phase_cancel, ctx);
        tokio::join!(parallel_fut, assertions_fut)
    };

    action_results.extend(parallel_results);

    let first_failing_assertion = assertion_results.iter().find(|a| !a.passed).map(|a| a.kind.clone());
    let success = fatal_error.is_none() && first_failing_assertion.is_none();
    let error = fatal_error.or_else(|| {
        first_failing_assertion.map(|kind| format!("assertion {kind:?} did not pass"))
    });

    // Step 5: end phase, cut the phase-scoped signal. Parallel actions and
    // assertions have already been awaited to completion above, so this
    // cancel is a formality for any future straggler rather than something
    // this call waits on — `cancellation_grace` bounds how long the
    // Supervisor gives an in-flight scenario-level cancel to unwind
    // (`spec.md §4.5`), not this per-phase cut.
    let end_time = Utc::now();
    phase_cancel.cancel();

    if !success {
        info!(phase = %phase.name, error = ?error, "phase failed");
    } else {
        info!(phase = %phase.name, "phase succeeded");
    }

    PhaseResult {
        phase_name: phase.name.clone(),
        start_time,
        end_time,
        success,
        error,
        actions: action_results,
        assertions: assertion_results,
    }
}

pub(crate) fn action_timeout(ctx: &EngineContext, service: &str) -> Duration {
    ctx.config
        .services
        .get(service)
        .map(|s| s.timeout)
        .unwrap_or(ctx.config.action_timeout_default)
}

fn action_deadline(phase_deadline: Instant, action_timeout: Duration) -> Instant {
    (Instant::now() + action_timeout).min(phase_deadline)
}

/// Runs a single action and returns its [`ActionResult`] alongside a fatal
/// error message when it did not succeed. `validate` is re-run immediately
/// before `execute` as defense-in-depth (`spec.md §4.1`).
async fn run_action(
    action: &Action,
    deadline: Instant,
    cancel: &CancellationToken,
    ctx: &EngineContext,
) -> (ActionResult, Option<String>) {
    let start_time = Utc::now();
    let correlation_id = new_correlation_id(&action.service, &action.kind);

    let outcome = match ctx.drivers.get(&action.service) {
        Ok(driver) => match driver.validate(action) {
            Ok(()) => driver.execute(action, deadline, &correlation_id, cancel).await,
            Err(invalid) => Err(chaos_drivers::ActionFailure::non_retryable(invalid.reason)),
        },
        Err(err) => Err(chaos_drivers::ActionFailure::non_retryable(err.to_string())),
    };

    let end_time = Utc::now();
    let (success, error) = match &outcome {
        Ok(()) => (true, None),
        Err(failure) => (false, Some(failure.reason.clone())),
    };

    (
        ActionResult {
            service: action.service.clone(),
            kind: action.kind.clone(),
            start_time,
            end_time,
            success,
            error: error.clone(),
            correlation_id,
        },
        error,
    )
}

/// Step 3: each parallel action waits its own `delay` from phase start,
/// then executes with the remaining phase deadline.
async fn run_parallel_actions(
    phase: &Phase,
    phase_deadline: Instant,
    cancel: &CancellationToken,
    ctx: &EngineContext,
) -> Vec<ActionResult> {
    let futures = phase.parallel_actions.iter().map(|parallel: &ParallelAction| {
        let cancel = cancel.clone();
        async move {
            if parallel.delay > Duration::ZERO {
                if cancel.race(tokio::time::sleep(parallel.delay)).await.is_none() {
                    let now = Utc::now();
                    return ActionResult {
                        service: parallel.action.service.clone(),
                        kind: parallel.action.kind.clone(),
                        start_time: now,
                        end_time: now,
                        success: false,
                        error: Some("canceled".to_string()),
                        correlation_id: new_correlation_id(&parallel.action.service, &parallel.action.kind),
                    };
                }
            }
            let (result, _fatal_ignored) = run_action(&parallel.action, phase_deadline, &cancel, ctx).await;
            result
        }
    });

    join_all(futures).await
}

/// Step 4: every assertion is launched concurrently and independently;
/// the phase waits for all of them. Each assertion's deadline is
/// `phase_start + assertion.within` (`spec.md §4.3` step 4), measured from
/// when the phase itself started — not from when this function happens to
/// be invoked, which may be well after phase start if sequential actions
/// ran first.
async fn run_assertions(
    phase: &Phase,
    phase_start_instant: Instant,
    phase_deadline: Instant,
    cancel: &CancellationToken,
    ctx: &EngineContext,
) -> Vec<AssertionResult> {
    let futures = phase.assertions.iter().map(|assertion| {
        let cancel = cancel.clone();
        async move {
            match ctx.evaluators.get(&assertion.kind) {
                Ok(evaluator) => {
                    let assertion_deadline = (phase_start_instant + assertion.within).min(phase_deadline);
                    let poll_interval = ctx.evaluators.poll_interval(&assertion.kind);
                    evaluator.evaluate(assertion, assertion_deadline, &cancel, poll_interval).await
                }
                Err(err) => AssertionResult {
                    kind: assertion.kind.clone(),
                    passed: false,
                    message: err.to_string(),
                    timestamp: Utc::now(),
                    evidence: Default::default(),
                    elapsed: Duration::ZERO,
                },
            }
        }
    });

    join_all(futures).await
}
