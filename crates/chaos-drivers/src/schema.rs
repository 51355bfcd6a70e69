//! Per-kind parameter schema checking used by [`crate::http_driver::HttpServiceDriver::validate`].

use std::collections::BTreeMap;

use chaos_model::Value;

use crate::error::InvalidParameter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Int,
    Float,
    Bool,
    Duration,
}

#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

pub fn validate_parameters(
    spec: &[ParamSpec],
    parameters: &BTreeMap<String, Value>,
) -> Result<(), InvalidParameter> {
    for field in spec {
        match parameters.get(field.name) {
            Some(value) if !matches_kind(value, field.kind) => {
                return Err(InvalidParameter {
                    reason: format!(
                        "parameter {:?} expected {:?}, got {}",
                        field.name,
                        field.kind,
                        value.kind_name()
                    ),
                });
            }
            None if field.required => {
                return Err(InvalidParameter {
                    reason: format!("missing required parameter {:?}", field.name),
                });
            }
            _ => {}
        }
    }
    Ok(())
}

fn matches_kind(value: &Value, kind: ParamKind) -> bool {
    match kind {
        ParamKind::String => value.as_str().is_some(),
        ParamKind::Int => value.as_int().is_some(),
        ParamKind::Float => value.as_float().is_some(),
        ParamKind::Bool => value.as_bool().is_some(),
        ParamKind::Duration => value.as_duration().is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_parameter_is_rejected() {
        let spec = vec![ParamSpec::required("latency_ms", ParamKind::Int)];
        let result = validate_parameters(&spec, &BTreeMap::new());
        assert!(result.is_err());
    }

    #[test]
    fn wrong_type_is_rejected() {
        let spec = vec![ParamSpec::required("latency_ms", ParamKind::Int)];
        let mut params = BTreeMap::new();
        params.insert("latency_ms".to_string(), Value::String("fast".into()));
        assert!(validate_parameters(&spec, &params).is_err());
    }

    #[test]
    fn optional_parameter_may_be_absent() {
        let spec = vec![ParamSpec::optional("reason", ParamKind::String)];
        assert!(validate_parameters(&spec, &BTreeMap::new()).is_ok());
    }
}
