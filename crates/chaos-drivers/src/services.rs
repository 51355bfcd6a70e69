//! Concrete per-service driver constructors for the six target services
//! named in `spec.md §4.1`: exchange, custodian, market-data, trading,
//! risk, audit. Each is the same [`HttpServiceDriver`] wire client with a
//! service-specific action-kind schema.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::http_driver::HttpServiceDriver;
use crate::schema::{ParamKind, ParamSpec};

/// Per-service endpoint configuration (`spec.md §6` "Per-service base URLs
/// and timeouts").
#[derive(Debug, Clone)]
pub struct ServiceEndpoint {
    pub base_url: String,
    pub timeout: Duration,
}

pub fn exchange_driver(endpoint: ServiceEndpoint) -> HttpServiceDriver {
    let mut schemas = BTreeMap::new();
    schemas.insert(
        "inject_latency".to_string(),
        vec![ParamSpec::required("latency_ms", ParamKind::Int)],
    );
    schemas.insert(
        "reject_orders".to_string(),
        vec![ParamSpec::optional("reason", ParamKind::String)],
    );
    schemas.insert("disconnect".to_string(), vec![]);
    schemas.insert("reconnect".to_string(), vec![]);
    HttpServiceDriver::new("exchange", endpoint.base_url, endpoint.timeout, schemas)
}

pub fn custodian_driver(endpoint: ServiceEndpoint) -> HttpServiceDriver {
    let mut schemas = BTreeMap::new();
    schemas.insert(
        "freeze_withdrawals".to_string(),
        vec![ParamSpec::required("account_id", ParamKind::String)],
    );
    schemas.insert("simulate_outage".to_string(), vec![ParamSpec::required("duration", ParamKind::Duration)]);
    HttpServiceDriver::new("custodian", endpoint.base_url, endpoint.timeout, schemas)
}

pub fn market_data_driver(endpoint: ServiceEndpoint) -> HttpServiceDriver {
    let mut schemas = BTreeMap::new();
    schemas.insert(
        "inject_price_divergence".to_string(),
        vec![
            ParamSpec::required("symbol", ParamKind::String),
            ParamSpec::required("divergence_bps", ParamKind::Int),
        ],
    );
    schemas.insert("stale_feed".to_string(), vec![ParamSpec::required("symbol", ParamKind::String)]);
    HttpServiceDriver::new("market-data", endpoint.base_url, endpoint.timeout, schemas)
}

pub fn trading_driver(endpoint: ServiceEndpoint) -> HttpServiceDriver {
    let mut schemas = BTreeMap::new();
    schemas.insert("halt_trading".to_string(), vec![ParamSpec::optional("reason", ParamKind::String)]);
    schemas.insert(
        "throttle".to_string(),
        vec![ParamSpec::required("max_orders_per_sec", ParamKind::Int)],
    );
    HttpServiceDriver::new("trading", endpoint.base_url, endpoint.timeout, schemas)
}

pub fn risk_driver(endpoint: ServiceEndpoint) -> HttpServiceDriver {
    let mut schemas = BTreeMap::new();
    schemas.insert(
        "trigger_alert".to_string(),
        vec![ParamSpec::required("severity", ParamKind::String)],
    );
    schemas.insert("block_trades".to_string(), vec![ParamSpec::required("symbol", ParamKind::String)]);
    HttpServiceDriver::new("risk", endpoint.base_url, endpoint.timeout, schemas)
}

pub fn audit_driver(endpoint: ServiceEndpoint) -> HttpServiceDriver {
    let mut schemas = BTreeMap::new();
    schemas.insert(
        "inject_log_delay".to_string(),
        vec![ParamSpec::required("delay_ms", ParamKind::Int)],
    );
    schemas.insert("corrupt_event".to_string(), vec![ParamSpec::required("event_id", ParamKind::String)]);
    HttpServiceDriver::new("audit", endpoint.base_url, endpoint.timeout, schemas)
}
