use serde_json::{Map, Value};
use std::time::Instant;
use tracing::{debug, warn};

use super::context::RequestContext;
use super::decode::apply_custom_type;
use crate::error::ApiError;
use crate::router::ParamVec;
use crate::routes::{CompiledParameter, CompiledRoute, ParameterSource};
use crate::validator;

/// Handler arguments in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArguments {
    values: Map<String, Value>,
}

impl BoundArguments {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    #[must_use]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    #[must_use]
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }
}

/// Turns raw request data into typed, validated handler arguments.
///
/// For every declared parameter, in order:
///
/// 1. read the raw value from its source (path variable, query/body, header)
/// 2. substitute the declared default when the value is absent or empty
/// 3. fail with `<name>InputInvalid` if it is still absent and required
/// 4. cast to the primitive type and run the declared constraints
/// 5. apply the custom type, if any
///
/// The first failing parameter aborts binding. Optional parameters that
/// stay absent are bound as `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterBinder;

impl ParameterBinder {
    pub fn bind(
        route: &CompiledRoute,
        path_variables: &ParamVec,
        ctx: &RequestContext,
    ) -> Result<BoundArguments, ApiError> {
        let start = Instant::now();
        let mut values = Map::new();

        for param in &route.parameters {
            match bind_one(param, path_variables, ctx) {
                Ok(value) => {
                    values.insert(param.name().to_string(), value);
                }
                Err(e) => {
                    warn!(
                        handler_name = %route.handler(),
                        parameter = %param.name(),
                        source = %param.spec.source,
                        error_code = %e.code(),
                        "Parameter binding failed"
                    );
                    return Err(e);
                }
            }
        }

        debug!(
            handler_name = %route.handler(),
            bound = values.len(),
            duration_us = start.elapsed().as_micros(),
            "Parameters bound"
        );
        Ok(BoundArguments { values })
    }
}

fn raw_value(
    param: &CompiledParameter,
    path_variables: &ParamVec,
    ctx: &RequestContext,
) -> Result<Option<Value>, ApiError> {
    let name = param.name();
    Ok(match param.spec.source {
        ParameterSource::PathVariable => {
            let Some((_, raw)) = path_variables.iter().find(|(k, _)| k.as_ref() == name) else {
                return Ok(None);
            };
            let decoded = urlencoding::decode(raw).map_err(|_| {
                ApiError::parameter(
                    name,
                    "Invalid",
                    format!("Parameter '{name}' is not valid UTF-8 after decoding"),
                )
            })?;
            Some(Value::String(decoded.into_owned()))
        }
        ParameterSource::QueryOrBody => ctx.param(name)?.cloned(),
        ParameterSource::Header => ctx.header(name).map(Value::String),
    })
}

fn bind_one(
    param: &CompiledParameter,
    path_variables: &ParamVec,
    ctx: &RequestContext,
) -> Result<Value, ApiError> {
    let spec = &param.spec;
    let mut raw = raw_value(param, path_variables, ctx)?;

    if validator::is_blank(raw.as_ref()) {
        if let Some(default) = &spec.default {
            raw = Some(default.clone());
        }
    }

    validator::require(spec, raw.as_ref())?;

    let raw = match raw {
        Some(raw) if !validator::is_blank(Some(&raw)) => raw,
        _ => return Ok(Value::Null),
    };

    let value = validator::coerce(spec, &raw)?;
    validator::validate(param, &value)?;

    match spec.custom_type {
        Some(custom) => apply_custom_type(param.name(), custom, value),
        None => Ok(value),
    }
}
