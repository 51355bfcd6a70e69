//! Scenario execution engine: Phase Runner (C5), Rollback Controller (C6),
//! Execution Supervisor (C7), and Execution Registry (C8).

pub mod context;
pub mod error;
pub mod ids;
pub mod phase_runner;
pub mod registry;
pub mod rollback;
pub mod supervisor;

#[cfg(test)]
mod test_support;

pub use context::EngineContext;
pub use error::{AssertionFailureReason, EngineError};
pub use registry::ExecutionRegistry;
pub use supervisor::execute_scenario;
