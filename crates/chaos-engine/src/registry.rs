//! Execution Registry (C8, `spec.md §4.6`).
//!
//! Fans scenario execution out across concurrently running executions,
//! the way the teacher's `workers::manager::WorkerPoolManager` fans work
//! out across a `DashMap<Uuid, Worker>` — each execution gets its own
//! spawned task and cancellation handle, looked up by `execution_id`
//! instead of a worker id.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

use chaos_model::Scenario;
use chaos_record::{ExecutionRecord, ExecutionStatus, ExecutionSummary, RegistryStatistics};
use chaos_resilience::CancellationToken;

use crate::context::EngineContext;
use crate::error::EngineError;
use crate::supervisor::execute_scenario;

struct Entry {
    cancel: CancellationToken,
    record: Arc<Mutex<ExecutionRecord>>,
    task: JoinHandle<()>,
    completed_at: Mutex<Option<tokio::time::Instant>>,
}

/// Owns every execution the engine is currently tracking. Cheaply
/// cloneable — clones share the same underlying map and running-count.
#[derive(Clone)]
pub struct ExecutionRegistry {
    ctx: EngineContext,
    running: Arc<AtomicU32>,
    entries: Arc<DashMap<String, Entry>>,
}

impl ExecutionRegistry {
    pub fn new(ctx: EngineContext) -> Self {
        Self {
            ctx,
            running: Arc::new(AtomicU32::new(0)),
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Validates and spawns `scenario`, returning its `execution_id`
    /// immediately — the caller does not wait for the run to finish.
    /// Rejects with [`EngineError::CapacityExceeded`] once
    /// `max_concurrent_executions` running executions are already tracked
    /// (`spec.md §4.6`).
    pub fn submit(&self, scenario: Scenario) -> Result<String, EngineError> {
        scenario
            .validate()
            .map_err(|err| EngineError::InvalidScenario(err.to_string()))?;

        if self.running.load(Ordering::SeqCst) >= self.ctx.config.max_concurrent_executions {
            return Err(EngineError::CapacityExceeded);
        }
        self.running.fetch_add(1, Ordering::SeqCst);

        // `spec.md §4.5` step 1: regenerate on collision against the
        // registry. Collisions are astronomically unlikely with a fresh
        // v4 uuid per id, but a terminal, never-evicted entry could in
        // principle still occupy the slot.
        let mut execution_id = crate::ids::new_execution_id();
        while self.entries.contains_key(&execution_id) {
            execution_id = crate::ids::new_execution_id();
        }

        let cancel = CancellationToken::new();
        let record = Arc::new(Mutex::new(ExecutionRecord::new(
            execution_id.clone(),
            scenario.clone(),
            chrono::Utc::now(),
        )));

        let task_cancel = cancel.clone();
        let task_ctx = self.ctx.clone();
        let task_record = record.clone();
        let running = self.running.clone();
        let entries = self.entries.clone();
        let task_execution_id = execution_id.clone();

        let task = tokio::spawn(async move {
            let finished = execute_scenario(task_execution_id.clone(), scenario, task_cancel, task_ctx).await;
            *task_record.lock().await = finished;
            running.fetch_sub(1, Ordering::SeqCst);
            if let Some(mut entry) = entries.get_mut(&task_execution_id) {
                *entry.completed_at.lock().await = Some(tokio::time::Instant::now());
            }
        });

        self.entries.insert(
            execution_id.clone(),
            Entry {
                cancel,
                record,
                task,
                completed_at: Mutex::new(None),
            },
        );

        info!(execution_id = %execution_id, "execution submitted");
        Ok(execution_id)
    }

    /// Requests cancellation of a running execution. Terminal states are
    /// absorbing (`spec.md §4.6`): stopping an execution whose task has
    /// already finished returns [`EngineError::AlreadyFinished`] rather
    /// than silently doing nothing.
    pub fn stop(&self, execution_id: &str) -> Result<(), EngineError> {
        let entry = self
            .entries
            .get(execution_id)
            .ok_or_else(|| EngineError::UnknownExecution { execution_id: execution_id.to_string() })?;
        if entry.task.is_finished() {
            return Err(EngineError::AlreadyFinished { execution_id: execution_id.to_string() });
        }
        entry.cancel.cancel();
        Ok(())
    }

    pub async fn get(&self, execution_id: &str) -> Option<ExecutionRecord> {
        let entry = self.entries.get(execution_id)?;
        Some(entry.record.lock().await.clone())
    }

    pub async fn list(&self) -> Vec<ExecutionSummary> {
        let mut summaries = Vec::with_capacity(self.entries.len());
        for entry in self.entries.iter() {
            summaries.push(entry.record.lock().await.summary());
        }
        summaries
    }

    pub async fn statistics(&self) -> RegistryStatistics {
        let mut statuses = Vec::with_capacity(self.entries.len());
        for entry in self.entries.iter() {
            statuses.push(entry.record.lock().await.status);
        }
        RegistryStatistics::from_statuses(statuses.into_iter())
    }

    /// Drops any tracked execution that finished more than
    /// `execution_retention` ago. The engine does not run this on a
    /// timer itself — callers (the binary's own scheduling loop) decide
    /// the sweep cadence.
    pub async fn sweep_expired(&self) {
        let retention = self.ctx.config.execution_retention;
        let mut expired = Vec::new();
        for entry in self.entries.iter() {
            let status = entry.record.lock().await.status;
            if !matches!(status, ExecutionStatus::Pending | ExecutionStatus::Running) {
                if let Some(completed_at) = *entry.completed_at.lock().await {
                    if completed_at.elapsed() >= retention {
                        expired.push(entry.key().clone());
                    }
                }
            }
        }
        for execution_id in expired {
            self.entries.remove(&execution_id);
        }
    }

    /// Cancels every running execution and waits up to
    /// `2 * cancellation_grace` for them to unwind (`spec.md §11`
    /// supplemented graceful shutdown), then returns regardless of
    /// whether every task has actually finished.
    pub async fn shutdown(&self) {
        for entry in self.entries.iter() {
            entry.cancel.cancel();
        }
        let grace = self.ctx.config.cancellation_grace * 2;
        let deadline = tokio::time::Instant::now() + grace;
        // Poll is_finished() rather than holding a shard guard across an
        // await: each entry's own task separately locks the same map to
        // record its completion, so awaiting while still borrowing the
        // map would deadlock against it.
        loop {
            let all_finished = self.entries.iter().all(|entry| entry.task.is_finished());
            if all_finished || tokio::time::Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }
}
