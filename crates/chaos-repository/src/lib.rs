//! The data-persistence adapter is explicitly out of scope
//! (`spec.md §1`): this crate is only the opaque seam the engine calls
//! through at finalize. A real repository (Postgres rows keyed by
//! `execution_id`, nested JSON for phases/actions/assertions per
//! `spec.md §6`) lives outside this workspace; [`InMemoryRepository`] here
//! exists purely so the engine and its tests have something to run
//! against without a real datastore.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use chaos_record::ExecutionRecord;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("repository write failed: {0}")]
    WriteFailed(String),
}

/// Called by the Supervisor exactly once per execution, at finalize
/// (`spec.md §6`). A failure here is logged but never changes the
/// user-visible verdict already captured in the `ExecutionRecord`.
#[async_trait]
pub trait ExecutionRepository: Send + Sync {
    async fn save(&self, record: &ExecutionRecord) -> Result<(), RepositoryError>;
}

#[derive(Default)]
pub struct InMemoryRepository {
    saved: Mutex<Vec<ExecutionRecord>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<ExecutionRecord> {
        self.saved.lock().await.clone()
    }
}

#[async_trait]
impl ExecutionRepository for InMemoryRepository {
    async fn save(&self, record: &ExecutionRecord) -> Result<(), RepositoryError> {
        self.saved.lock().await.push(record.clone());
        Ok(())
    }
}

/// A repository that always fails, for exercising the "logged but
/// non-fatal" persistence-failure path (`spec.md §7 RepositoryFailure`).
pub struct AlwaysFailingRepository;

#[async_trait]
impl ExecutionRepository for AlwaysFailingRepository {
    async fn save(&self, _record: &ExecutionRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::WriteFailed("simulated outage".to_string()))
    }
}
