//! Scenario and context builders shared across the end-to-end tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chaos_assertions::AssertionEvaluator;
use chaos_config::EngineConfig;
use chaos_drivers::{ActionDriver, DriverRegistry};
use chaos_assertions::EvaluatorRegistry;
use chaos_engine::EngineContext;
use chaos_model::{Action, Assertion, Phase, RollbackSpec, Scenario};
use chaos_repository::InMemoryRepository;

pub fn minimal_scenario(name: &str, phases: Vec<Phase>) -> Scenario {
    Scenario {
        api_version: "chaos.trading/v1".to_string(),
        name: name.to_string(),
        description: String::new(),
        version: "1".to_string(),
        duration: Duration::from_secs(60 * phases.len().max(1) as u64),
        timeout: Duration::from_secs(60 * phases.len().max(1) as u64),
        variables: BTreeMap::new(),
        phases,
        rollback: RollbackSpec::default(),
        success_criteria: HashSet::new(),
    }
}

pub fn phase(name: &str, actions: Vec<Action>, assertions: Vec<Assertion>) -> Phase {
    Phase {
        name: name.to_string(),
        duration: Duration::from_secs(30),
        actions,
        parallel_actions: vec![],
        assertions,
    }
}

pub fn action(service: &str, kind: &str) -> Action {
    Action { service: service.to_string(), kind: kind.to_string(), parameters: BTreeMap::new() }
}

pub fn assertion(kind: &str, within: Duration) -> Assertion {
    Assertion { kind: kind.to_string(), expect: "healthy".to_string(), within, parameters: BTreeMap::new() }
}

pub fn build_context(
    drivers: Vec<(&str, Arc<dyn ActionDriver>)>,
    evaluators: Vec<(&str, Arc<dyn AssertionEvaluator>)>,
) -> EngineContext {
    let mut driver_registry = DriverRegistry::new();
    for (service, driver) in drivers {
        driver_registry.register(service, driver);
    }

    let mut evaluator_registry = EvaluatorRegistry::new(Duration::from_millis(20));
    for (kind, evaluator) in evaluators {
        evaluator_registry.register(kind, evaluator);
    }

    EngineContext {
        drivers: Arc::new(driver_registry),
        evaluators: Arc::new(evaluator_registry),
        config: Arc::new(EngineConfig::default()),
        repository: Arc::new(InMemoryRepository::new()),
    }
}

pub fn build_context_with_config(
    drivers: Vec<(&str, Arc<dyn ActionDriver>)>,
    evaluators: Vec<(&str, Arc<dyn AssertionEvaluator>)>,
    config: EngineConfig,
) -> EngineContext {
    let mut ctx = build_context(drivers, evaluators);
    ctx.config = Arc::new(config);
    ctx
}
