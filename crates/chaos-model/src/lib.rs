//! Scenario data model for the chaos execution engine.
//!
//! Everything in this crate is plain data plus the structural invariants
//! from the scenario document (`spec.md §3`). It has no I/O and no
//! knowledge of drivers, evaluators, or the supervisor.

pub mod scenario;
pub mod value;

pub use scenario::{Action, Assertion, ParallelAction, Phase, RollbackSpec, Scenario, ScenarioError, Tag};
pub use value::Value;
