//! # Parameter Validation
//!
//! Casts raw input to a declared primitive type and enforces the declared
//! constraints. Checks run in a fixed order and stop at the first failure:
//!
//! 1. presence ([`require`]): `<name>InputInvalid`
//! 2. primitive cast ([`coerce`]): `<name>Invalid`
//! 3. allowed-value set: `<name>ValueInvalid`
//! 4. numeric bounds: `<name>ValueMinExceeded` / `<name>ValueMaxExceeded`,
//!    or codepoint length bounds: `<name>LengthMinExceeded` / `<name>LengthMaxExceeded`
//! 5. pattern: `<name>ValuePatternFailure`
//!
//! Steps 3 to 5 are bundled in [`validate`].

use serde_json::{Number, Value};

use crate::error::ApiError;
use crate::routes::{CompiledParameter, ParameterSpec, PrimitiveType};

/// Whether a raw value counts as absent (missing, null or an empty string).
#[inline]
#[must_use]
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Fail a required parameter whose value is absent after default substitution.
pub fn require(spec: &ParameterSpec, value: Option<&Value>) -> Result<(), ApiError> {
    if spec.required && is_blank(value) {
        return Err(ApiError::parameter(
            &spec.name,
            "InputInvalid",
            format!("Parameter '{}' is required", spec.name),
        ));
    }
    Ok(())
}

/// Cast a value to a primitive type, `None` if it has no canonical form.
///
/// - `int` accepts integral numbers and plain integer strings (`"42"`, `"-7"`)
/// - `float` accepts any finite number or numeric string
/// - `bool` accepts only `true`/`false`, `0`/`1` and `"0"`/`"1"`
/// - `string` accepts strings and stringifies numbers and booleans
/// - `mixed` is returned unchanged
#[must_use]
pub fn cast(primitive: PrimitiveType, value: &Value) -> Option<Value> {
    match primitive {
        PrimitiveType::Mixed => Some(value.clone()),
        PrimitiveType::String => match value {
            Value::String(s) => Some(Value::String(s.clone())),
            Value::Number(n) => Some(Value::String(n.to_string())),
            Value::Bool(b) => Some(Value::String(if *b { "1" } else { "0" }.to_string())),
            _ => None,
        },
        PrimitiveType::Int => as_integer(value).map(Value::from),
        PrimitiveType::Float => as_number(value)
            .and_then(Number::from_f64)
            .map(Value::Number),
        PrimitiveType::Bool => match value {
            Value::Bool(b) => Some(Value::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(Value::Bool(false)),
                Some(1) => Some(Value::Bool(true)),
                _ => None,
            },
            Value::String(s) => match s.trim() {
                "0" => Some(Value::Bool(false)),
                "1" => Some(Value::Bool(true)),
                _ => None,
            },
            _ => None,
        },
    }
}

/// Cast with the parameter's error code on failure.
pub fn coerce(spec: &ParameterSpec, value: &Value) -> Result<Value, ApiError> {
    cast(spec.primitive, value).ok_or_else(|| {
        ApiError::parameter(
            &spec.name,
            "Invalid",
            format!("Parameter '{}' must be a valid {}", spec.name, spec.primitive),
        )
    })
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Integer text only (optional sign, digits); exponent and decimal forms are
/// rejected. JSON numbers must be integral and representable as `i64`.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            // 2^63 is exactly representable, so the upper bound is exclusive.
            let f = n.as_f64()?;
            (f.fract() == 0.0 && f >= -TWO_POW_63 && f < TWO_POW_63).then_some(f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

/// String form used for pattern and length checks.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn format_bound(bound: f64) -> String {
    if bound.fract() == 0.0 {
        format!("{}", bound as i64)
    } else {
        bound.to_string()
    }
}

fn loosely_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => match (a, b) {
            (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => {
                false
            }
            _ => text_of(a) == text_of(b),
        },
    }
}

/// Fail with `<name>ValueInvalid` when the value is outside the declared set.
pub fn check_allowed(spec: &ParameterSpec, value: &Value) -> Result<(), ApiError> {
    let Some(allowed) = &spec.allowed_values else {
        return Ok(());
    };
    if allowed.iter().any(|a| loosely_equal(value, a)) {
        return Ok(());
    }
    let name = spec.name.as_str();
    let choices: Vec<String> = allowed.iter().map(text_of).collect();
    Err(ApiError::parameter(
        name,
        "ValueInvalid",
        format!("Parameter '{name}' must be one of: {}", choices.join(", ")),
    ))
}

/// Run the allowed-set, bound and pattern checks on a cast value.
pub fn validate(param: &CompiledParameter, value: &Value) -> Result<(), ApiError> {
    let spec = &param.spec;
    let name = spec.name.as_str();

    check_allowed(spec, value)?;

    let numeric = match spec.primitive {
        PrimitiveType::Int | PrimitiveType::Float | PrimitiveType::Mixed => as_number(value),
        PrimitiveType::String | PrimitiveType::Bool => None,
    };

    if let Some(n) = numeric {
        check_numeric(name, n, spec.min, spec.max)?;
    } else if spec.primitive.is_string_like() {
        let length = text_of(value).chars().count() as f64;
        check_length(name, length, spec.min, spec.max)?;
    }

    if let Some(pattern) = &param.pattern {
        if !pattern.is_match(&text_of(value)) {
            return Err(ApiError::parameter(
                name,
                "ValuePatternFailure",
                format!("Parameter '{name}' does not match the required pattern"),
            ));
        }
    }

    Ok(())
}

fn check_numeric(name: &str, n: f64, min: Option<f64>, max: Option<f64>) -> Result<(), ApiError> {
    if let Some(min) = min.filter(|m| n < *m) {
        return Err(ApiError::parameter(
            name,
            "ValueMinExceeded",
            format!("Parameter '{name}' must be at least {}", format_bound(min)),
        ));
    }
    if let Some(max) = max.filter(|m| n > *m) {
        return Err(ApiError::parameter(
            name,
            "ValueMaxExceeded",
            format!("Parameter '{name}' must be at most {}", format_bound(max)),
        ));
    }
    Ok(())
}

fn check_length(
    name: &str,
    length: f64,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<(), ApiError> {
    if let Some(min) = min.filter(|m| length < *m) {
        return Err(ApiError::parameter(
            name,
            "LengthMinExceeded",
            format!(
                "Parameter '{name}' must be at least {} characters long",
                format_bound(min)
            ),
        ));
    }
    if let Some(max) = max.filter(|m| length > *m) {
        return Err(ApiError::parameter(
            name,
            "LengthMaxExceeded",
            format!(
                "Parameter '{name}' must be at most {} characters long",
                format_bound(max)
            ),
        ));
    }
    Ok(())
}
