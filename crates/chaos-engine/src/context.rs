//! Shared handles to drivers/evaluators/config/repository threaded through
//! the Phase Runner, Rollback Controller, and Supervisor.

use std::sync::Arc;

use chaos_assertions::EvaluatorRegistry;
use chaos_config::EngineConfig;
use chaos_drivers::DriverRegistry;
use chaos_repository::ExecutionRepository;

#[derive(Clone)]
pub struct EngineContext {
    pub drivers: Arc<DriverRegistry>,
    pub evaluators: Arc<EvaluatorRegistry>,
    pub config: Arc<EngineConfig>,
    pub repository: Arc<dyn ExecutionRepository>,
}
