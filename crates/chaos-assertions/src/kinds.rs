//! Concrete probes for the nine assertion kinds in `spec.md §4.2`:
//! `system_health`, `risk_alert`, `trading_adaptation`, `system_recovery`,
//! `alert_resolution`, `price_divergence`, `performance_recovery`,
//! `audit_correlation`, and the generic `custom` escape hatch.
//!
//! Each probe is a read-only HTTP GET against the observability surface
//! named in its `base_url`; the response is a JSON array of snapshot
//! objects, which the probe turns into [`Observation`]s by applying the
//! kind's own notion of what `expect`/`parameters` mean.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as Json;

use chaos_model::{Assertion, Value};

use crate::probe::{ConditionProbe, Observation};

pub struct HttpStateProbe {
    client: reqwest::Client,
    url: String,
    matcher: fn(&Json, &Assertion) -> bool,
}

impl HttpStateProbe {
    pub fn new(url: impl Into<String>, timeout: Duration, matcher: fn(&Json, &Assertion) -> bool) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("building the assertion probe HTTP client"),
            url: url.into(),
            matcher,
        }
    }
}

#[async_trait]
impl ConditionProbe for HttpStateProbe {
    async fn poll(&self, assertion: &Assertion) -> Result<Vec<Observation>, String> {
        let body: Vec<Json> = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| format!("probe request failed: {e}"))?
            .json()
            .await
            .map_err(|e| format!("probe response was not a JSON array: {e}"))?;

        Ok(body
            .into_iter()
            .map(|item| observation_from_json(item, assertion, self.matcher))
            .collect())
    }
}

fn observation_from_json(item: Json, assertion: &Assertion, matcher: fn(&Json, &Assertion) -> bool) -> Observation {
    let timestamp = item
        .get("timestamp")
        .and_then(Json::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let matches = matcher(&item, assertion);

    let mut evidence = BTreeMap::new();
    if let Json::Object(map) = &item {
        for (k, v) in map {
            evidence.insert(k.clone(), json_to_value(v));
        }
    }

    Observation {
        timestamp,
        matches,
        evidence,
    }
}

fn json_to_value(v: &Json) -> Value {
    match v {
        Json::String(s) => Value::String(s.clone()),
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) if n.is_i64() => Value::Int(n.as_i64().unwrap()),
        Json::Number(n) => Value::Float(n.as_f64().unwrap_or_default()),
        Json::Array(items) => Value::List(items.iter().map(json_to_value).collect()),
        Json::Object(map) => Value::Map(map.iter().map(|(k, v)| (k.clone(), json_to_value(v))).collect()),
        Json::Null => Value::Bool(false),
    }
}

fn field_equals(item: &Json, field: &str, expected: &str) -> bool {
    item.get(field).and_then(Json::as_str) == Some(expected)
}

fn param_str<'a>(assertion: &'a Assertion, name: &str) -> Option<&'a str> {
    assertion.parameters.get(name).and_then(Value::as_str)
}

fn param_int(assertion: &Assertion, name: &str) -> Option<i64> {
    assertion.parameters.get(name).and_then(Value::as_int)
}

pub fn system_health_matcher(item: &Json, assertion: &Assertion) -> bool {
    field_equals(item, "status", &assertion.expect)
}

pub fn risk_alert_matcher(item: &Json, assertion: &Assertion) -> bool {
    field_equals(item, "alert_type", &assertion.expect)
}

pub fn trading_adaptation_matcher(item: &Json, assertion: &Assertion) -> bool {
    field_equals(item, "adaptation", &assertion.expect)
}

pub fn system_recovery_matcher(item: &Json, assertion: &Assertion) -> bool {
    field_equals(item, "state", &assertion.expect)
}

pub fn alert_resolution_matcher(item: &Json, assertion: &Assertion) -> bool {
    let resolved = item.get("resolved").and_then(Json::as_bool).unwrap_or(false);
    let alert_id_matches = match param_str(assertion, "alert_id") {
        Some(expected) => field_equals(item, "alert_id", expected),
        None => true,
    };
    resolved && alert_id_matches
}

pub fn price_divergence_matcher(item: &Json, assertion: &Assertion) -> bool {
    let symbol_matches = match param_str(assertion, "symbol") {
        Some(expected) => field_equals(item, "symbol", expected),
        None => true,
    };
    let threshold = param_int(assertion, "threshold_bps").unwrap_or(0);
    let divergence = item.get("divergence_bps").and_then(Json::as_i64).unwrap_or(0);
    symbol_matches && divergence.abs() >= threshold
}

pub fn performance_recovery_matcher(item: &Json, assertion: &Assertion) -> bool {
    let max_latency = param_int(assertion, "max_latency_ms").unwrap_or(i64::MAX);
    let observed = item.get("latency_ms").and_then(Json::as_i64).unwrap_or(i64::MAX);
    observed <= max_latency
}

pub fn audit_correlation_matcher(item: &Json, assertion: &Assertion) -> bool {
    match param_str(assertion, "correlation_id") {
        Some(expected) => field_equals(item, "correlation_id", expected),
        None => false,
    }
}

/// Generic escape hatch: `parameters = {field, equals}` compared against
/// the observation's raw JSON field. `expect` is unused by this kind —
/// the field/equals pair carries the predicate instead.
pub fn custom_matcher(item: &Json, assertion: &Assertion) -> bool {
    let (Some(field), Some(equals)) = (param_str(assertion, "field"), param_str(assertion, "equals")) else {
        return false;
    };
    field_equals(item, field, equals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Map;

    fn assertion(kind: &str, expect: &str, params: Map<String, Value>) -> Assertion {
        Assertion {
            kind: kind.to_string(),
            expect: expect.to_string(),
            within: Duration::from_secs(1),
            parameters: params,
        }
    }

    #[test]
    fn system_health_matches_status_field() {
        let item = serde_json::json!({"status": "healthy"});
        assert!(system_health_matcher(&item, &assertion("system_health", "healthy", Map::new())));
        assert!(!system_health_matcher(&item, &assertion("system_health", "degraded", Map::new())));
    }

    #[test]
    fn price_divergence_checks_symbol_and_threshold() {
        let item = serde_json::json!({"symbol": "BTC-USD", "divergence_bps": 75});
        let mut params = Map::new();
        params.insert("symbol".to_string(), Value::from("BTC-USD"));
        params.insert("threshold_bps".to_string(), Value::Int(50));
        assert!(price_divergence_matcher(&item, &assertion("price_divergence", "", params.clone())));

        params.insert("threshold_bps".to_string(), Value::Int(100));
        assert!(!price_divergence_matcher(&item, &assertion("price_divergence", "", params)));
    }

    #[test]
    fn custom_matcher_requires_both_field_and_equals() {
        let item = serde_json::json!({"order_state": "canceled"});
        let mut params = Map::new();
        params.insert("field".to_string(), Value::from("order_state"));
        assert!(!custom_matcher(&item, &assertion("custom", "", params.clone())));
        params.insert("equals".to_string(), Value::from("canceled"));
        assert!(custom_matcher(&item, &assertion("custom", "", params)));
    }
}
