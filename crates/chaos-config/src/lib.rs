//! Configuration recognized by the engine (`spec.md §6`), layered the way
//! `agent-agency-config` layers `AppConfig`: defaults, then an optional
//! file, then environment variables (`CHAOS_` prefix), then validated.
//!
//! Configuration loading, service discovery, and logger/metrics plumbing
//! are themselves out of scope per `spec.md §1` — this crate is the one
//! seam through which the engine learns the handful of knobs it actually
//! reads.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EngineConfig {
    #[validate(range(min = 1))]
    pub max_concurrent_executions: u32,
    #[serde(with = "seconds")]
    pub default_scenario_timeout: Duration,
    #[serde(with = "seconds")]
    pub assertion_poll_interval: Duration,
    #[serde(default)]
    pub assertion_poll_interval_overrides: HashMap<String, SecondsDuration>,
    #[serde(with = "seconds")]
    pub action_timeout_default: Duration,
    #[serde(with = "seconds")]
    pub cancellation_grace: Duration,
    pub rollback: RollbackConfig,
    #[serde(with = "seconds")]
    pub execution_retention: Duration,
    #[serde(default)]
    pub services: HashMap<String, ServiceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RollbackConfig {
    pub enabled: bool,
    #[serde(with = "seconds")]
    pub timeout: Duration,
    pub aggressive_cleanup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServiceConfig {
    #[validate(url)]
    pub base_url: String,
    #[serde(with = "seconds")]
    pub timeout: Duration,
}

/// Newtype so `HashMap<String, SecondsDuration>` gets the same
/// whole-seconds wire format as every other duration field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecondsDuration(#[serde(with = "seconds")] pub Duration);

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_executions: 3,
            default_scenario_timeout: Duration::from_secs(2 * 3600),
            assertion_poll_interval: Duration::from_secs(5),
            assertion_poll_interval_overrides: HashMap::new(),
            action_timeout_default: Duration::from_secs(30),
            cancellation_grace: Duration::from_secs(2),
            rollback: RollbackConfig {
                enabled: true,
                timeout: Duration::from_secs(600),
                aggressive_cleanup: false,
            },
            execution_retention: Duration::from_secs(3600),
            services: HashMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn assertion_poll_interval_for(&self, kind: &str) -> Duration {
        self.assertion_poll_interval_overrides
            .get(kind)
            .map(|d| d.0)
            .unwrap_or(self.assertion_poll_interval)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("configuration failed validation: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Loads `EngineConfig` from (in increasing priority) compiled-in
/// defaults, an optional file at `path`, then `CHAOS_*` environment
/// variables, mirroring the layering in `agent-agency-config::loader`.
pub fn load(path: Option<&str>) -> Result<EngineConfig, ConfigError> {
    let defaults = EngineConfig::default();
    let mut builder = config::Config::builder().add_source(
        config::Config::try_from(&defaults)
            .expect("EngineConfig defaults must serialize cleanly")
    );

    if let Some(path) = path {
        debug!(path, "layering configuration file over compiled-in defaults");
        builder = builder.add_source(config::File::with_name(path).required(false));
    }

    builder = builder.add_source(config::Environment::with_prefix("CHAOS").separator("__"));

    let merged = builder.build()?;
    let engine_config: EngineConfig = merged.try_deserialize()?;
    info!(
        max_concurrent_executions = engine_config.max_concurrent_executions,
        "engine configuration loaded"
    );
    engine_config.validate()?;
    Ok(engine_config)
}

mod seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
