//! Wires the nine built-in assertion kinds into an [`EvaluatorRegistry`]
//! against a single observability base URL — the common case where all
//! kinds are served by one monitoring surface at different paths.

use std::sync::Arc;
use std::time::Duration;

use crate::kinds::{
    alert_resolution_matcher, audit_correlation_matcher, custom_matcher, performance_recovery_matcher,
    price_divergence_matcher, risk_alert_matcher, system_health_matcher, system_recovery_matcher,
    trading_adaptation_matcher, HttpStateProbe,
};
use crate::{EvaluatorRegistry, PollingEvaluator};

pub fn default_registry(
    observability_base_url: &str,
    probe_timeout: Duration,
    default_poll_interval: Duration,
) -> EvaluatorRegistry {
    let mut registry = EvaluatorRegistry::new(default_poll_interval);

    macro_rules! register_kind {
        ($kind:literal, $path:literal, $matcher:expr) => {
            let probe = Arc::new(HttpStateProbe::new(
                format!("{}/{}", observability_base_url.trim_end_matches('/'), $path),
                probe_timeout,
                $matcher,
            ));
            registry.register($kind, Arc::new(PollingEvaluator::new($kind, probe)));
        };
    }

    register_kind!("system_health", "health", system_health_matcher);
    register_kind!("risk_alert", "risk/alerts", risk_alert_matcher);
    register_kind!("trading_adaptation", "trading/adaptations", trading_adaptation_matcher);
    register_kind!("system_recovery", "health/recovery", system_recovery_matcher);
    register_kind!("alert_resolution", "alerts/resolutions", alert_resolution_matcher);
    register_kind!("price_divergence", "market-data/divergence", price_divergence_matcher);
    register_kind!("performance_recovery", "performance/recovery", performance_recovery_matcher);
    register_kind!("audit_correlation", "audit/correlations", audit_correlation_matcher);
    register_kind!("custom", "custom", custom_matcher);

    registry
}
