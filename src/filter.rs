//! # Response Filter
//!
//! Projects a handler's nested return value down to a declared public shape.
//!
//! A [`FilterSpec`] is a list of keys, each with a mode:
//!
//! | Marker          | Mode                         |
//! |-----------------|------------------------------|
//! | `name`          | include                      |
//! | `!name` `name!` | exclude                      |
//! | `?name` `name?` | include only if not empty    |
//!
//! Keys can carry a nested spec applied to the value under that key. In JSON
//! (and YAML) the nested form is an object entry:
//!
//! ```json
//! ["id", "name", {"?meta": ["x"]}, {"user": ["email", "!password"]}]
//! ```
//!
//! Filtering runs two passes over the same spec:
//!
//! 1. **Include pass**: at every level that declares include keys, keys not
//!    listed are dropped and nested specs are applied. An optional key whose
//!    nested projection is empty is dropped entirely.
//! 2. **Exclude pass**: excluded keys are removed and nested specs are
//!    followed for every other key.
//!
//! Lists are filtered element-wise. Scalars pass through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Include,
    Exclude,
    Optional,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterEntry {
    pub key: String,
    pub mode: FilterMode,
    pub nested: Option<FilterSpec>,
}

impl FilterEntry {
    fn marked_key(&self) -> String {
        match self.mode {
            FilterMode::Include => self.key.clone(),
            FilterMode::Exclude => format!("!{}", self.key),
            FilterMode::Optional => format!("?{}", self.key),
        }
    }

    #[inline]
    fn selects(&self) -> bool {
        self.mode != FilterMode::Exclude
    }
}

/// Malformed filter declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpecError(pub String);

impl fmt::Display for FilterSpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid filter: {}", self.0)
    }
}

impl std::error::Error for FilterSpecError {}

/// Recursive include/exclude projection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct FilterSpec {
    entries: Vec<FilterEntry>,
}

impl FilterSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a flat spec from marked keys, e.g. `["name", "!secret", "?tags"]`.
    pub fn from_keys<I, S>(keys: I) -> Result<Self, FilterSpecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut spec = Self::new();
        for raw in keys {
            spec.entries.push(parse_marked(raw.as_ref(), None)?);
        }
        Ok(spec)
    }

    /// Parse the JSON form described in the module docs.
    pub fn parse(value: &Value) -> Result<Self, FilterSpecError> {
        let mut spec = Self::new();
        match value {
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::String(raw) => spec.entries.push(parse_marked(raw, None)?),
                        Value::Object(map) => spec.push_object(map)?,
                        other => {
                            return Err(FilterSpecError(format!(
                                "list entries must be strings or objects, got {other}"
                            )))
                        }
                    }
                }
            }
            Value::Object(map) => spec.push_object(map)?,
            other => {
                return Err(FilterSpecError(format!(
                    "expected a list or an object, got {other}"
                )))
            }
        }
        Ok(spec)
    }

    fn push_object(&mut self, map: &Map<String, Value>) -> Result<(), FilterSpecError> {
        for (raw, value) in map {
            let nested = match value {
                Value::Array(_) | Value::Object(_) => Some(FilterSpec::parse(value)?),
                Value::Null | Value::Bool(true) => None,
                other => {
                    return Err(FilterSpecError(format!(
                        "value for '{raw}' must be a list or an object, got {other}"
                    )))
                }
            };
            self.entries.push(parse_marked(raw, nested)?);
        }
        Ok(())
    }

    #[must_use]
    pub fn include(self, key: impl Into<String>) -> Self {
        self.with_entry(key, FilterMode::Include, None)
    }

    #[must_use]
    pub fn exclude(self, key: impl Into<String>) -> Self {
        self.with_entry(key, FilterMode::Exclude, None)
    }

    #[must_use]
    pub fn optional(self, key: impl Into<String>) -> Self {
        self.with_entry(key, FilterMode::Optional, None)
    }

    #[must_use]
    pub fn nested(self, key: impl Into<String>, mode: FilterMode, nested: FilterSpec) -> Self {
        self.with_entry(key, mode, Some(nested))
    }

    fn with_entry(
        mut self,
        key: impl Into<String>,
        mode: FilterMode,
        nested: Option<FilterSpec>,
    ) -> Self {
        self.entries.push(FilterEntry {
            key: key.into(),
            mode,
            nested,
        });
        self
    }

    #[must_use]
    pub fn entries(&self) -> &[FilterEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that every key, at every depth, is non-empty.
    pub fn validate(&self) -> Result<(), FilterSpecError> {
        for entry in &self.entries {
            if entry.key.is_empty() {
                return Err(FilterSpecError("empty key".to_string()));
            }
            if let Some(nested) = &entry.nested {
                nested.validate()?;
            }
        }
        Ok(())
    }

    fn has_includes(&self) -> bool {
        self.entries.iter().any(FilterEntry::selects)
    }

    fn selecting(&self, key: &str) -> Option<&FilterEntry> {
        let mut found = None;
        for entry in self.entries.iter().filter(|e| e.selects() && e.key == key) {
            if entry.nested.is_some() {
                return Some(entry);
            }
            found.get_or_insert(entry);
        }
        found
    }

    fn excludes(&self, key: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.mode == FilterMode::Exclude && e.key == key)
    }

    /// Apply the include pass then the exclude pass.
    #[must_use]
    pub fn apply(&self, value: Value) -> Value {
        let included = self.include_pass(value);
        self.exclude_pass(included)
    }

    fn include_pass(&self, value: Value) -> Value {
        match value {
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|v| self.include_pass(v)).collect())
            }
            Value::Object(map) if self.has_includes() => {
                let mut out = Map::with_capacity(map.len());
                for (key, value) in map {
                    let Some(entry) = self.selecting(&key) else {
                        continue;
                    };
                    let value = match &entry.nested {
                        Some(nested) => {
                            if entry.mode == FilterMode::Optional
                                && is_empty_projection(&nested.apply(value.clone()))
                            {
                                continue;
                            }
                            nested.include_pass(value)
                        }
                        None => value,
                    };
                    out.insert(key, value);
                }
                Value::Object(out)
            }
            other => other,
        }
    }

    fn exclude_pass(&self, value: Value) -> Value {
        match value {
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|v| self.exclude_pass(v)).collect())
            }
            Value::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, value) in map {
                    if self.excludes(&key) {
                        continue;
                    }
                    let value = match self.selecting(&key).and_then(|e| e.nested.as_ref()) {
                        Some(nested) => nested.exclude_pass(value),
                        None => value,
                    };
                    out.insert(key, value);
                }
                Value::Object(out)
            }
            other => other,
        }
    }
}

/// A projection with nothing visible: an empty object, or a list of such.
fn is_empty_projection(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.iter().all(is_empty_projection),
        _ => false,
    }
}

fn parse_marked(raw: &str, nested: Option<FilterSpec>) -> Result<FilterEntry, FilterSpecError> {
    let trimmed = raw.trim();
    let mode = if trimmed.starts_with('!') || trimmed.ends_with('!') {
        FilterMode::Exclude
    } else if trimmed.starts_with('?') || trimmed.ends_with('?') {
        FilterMode::Optional
    } else {
        FilterMode::Include
    };
    let key = sanitize_key(trimmed);
    if key.is_empty() {
        return Err(FilterSpecError(format!("'{raw}' does not contain a key")));
    }
    Ok(FilterEntry { key, mode, nested })
}

/// Keep word characters and hyphens.
#[must_use]
pub fn sanitize_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

impl TryFrom<Value> for FilterSpec {
    type Error = FilterSpecError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        FilterSpec::parse(&value)
    }
}

impl From<FilterSpec> for Value {
    fn from(spec: FilterSpec) -> Self {
        let items = spec
            .entries
            .into_iter()
            .map(|entry| {
                let key = entry.marked_key();
                match entry.nested {
                    Some(nested) => {
                        let mut map = Map::new();
                        map.insert(key, Value::from(nested));
                        Value::Object(map)
                    }
                    None => Value::String(key),
                }
            })
            .collect();
        Value::Array(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(v: Value) -> FilterSpec {
        FilterSpec::parse(&v).unwrap()
    }

    #[test]
    fn test_include_list_is_a_whitelist() {
        let out = spec(json!(["name", "id"])).apply(json!({"name": "a", "id": 1, "secret": "x"}));
        assert_eq!(out, json!({"name": "a", "id": 1}));
    }

    #[test]
    fn test_optional_nested_dropped_when_empty() {
        let f = spec(json!({"?meta": ["x"]}));
        assert_eq!(f.apply(json!({"meta": {"y": 1}})), json!({}));
        assert_eq!(
            f.apply(json!({"meta": {"x": 1, "y": 2}})),
            json!({"meta": {"x": 1}})
        );
    }

    #[test]
    fn test_exclude_only_level_keeps_other_keys() {
        let out = spec(json!(["!password"])).apply(json!({"name": "a", "password": "p"}));
        assert_eq!(out, json!({"name": "a"}));

        let out = spec(json!(["password!"])).apply(json!({"name": "a", "password": "p"}));
        assert_eq!(out, json!({"name": "a"}));
    }

    #[test]
    fn test_nested_include_and_exclude() {
        let f = spec(json!(["id", {"user": ["name", "email", "!email"]}]));
        let out = f.apply(json!({
            "id": 7,
            "internal": true,
            "user": {"name": "Ann", "email": "a@b.c", "hash": "x"}
        }));
        assert_eq!(out, json!({"id": 7, "user": {"name": "Ann"}}));
    }

    #[test]
    fn test_lists_filtered_element_wise() {
        let f = spec(json!([{"items": ["id"]}]));
        let out = f.apply(json!({"items": [{"id": 1, "x": 2}, {"id": 2, "x": 3}], "total": 2}));
        assert_eq!(out, json!({"items": [{"id": 1}, {"id": 2}]}));

        let top = spec(json!(["id"])).apply(json!([{"id": 1, "x": 1}, {"id": 2}]));
        assert_eq!(top, json!([{"id": 1}, {"id": 2}]));
    }

    #[test]
    fn test_optional_list_of_empty_objects_is_dropped() {
        let f = spec(json!(["id", {"?tags": ["label"]}]));
        let out = f.apply(json!({"id": 1, "tags": [{"color": "red"}, {"color": "blue"}]}));
        assert_eq!(out, json!({"id": 1}));
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(spec(json!(["id"])).apply(json!("plain")), json!("plain"));
    }

    #[test]
    fn test_keys_are_sanitized() {
        let f = FilterSpec::from_keys(["? meta", "!se cret"]).unwrap();
        assert_eq!(f.entries()[0].key, "meta");
        assert_eq!(f.entries()[0].mode, FilterMode::Optional);
        assert_eq!(f.entries()[1].key, "secret");
        assert_eq!(f.entries()[1].mode, FilterMode::Exclude);
    }

    #[test]
    fn test_rejects_malformed_filters() {
        assert!(FilterSpec::parse(&json!("name")).is_err());
        assert!(FilterSpec::parse(&json!([1])).is_err());
        assert!(FilterSpec::parse(&json!(["!"])).is_err());
        assert!(FilterSpec::parse(&json!({"meta": 3})).is_err());
    }

    #[test]
    fn test_serde_uses_marked_list_form() {
        let f = FilterSpec::new()
            .include("id")
            .exclude("secret")
            .nested("meta", FilterMode::Optional, FilterSpec::new().include("x"));
        let value = serde_json::to_value(&f).unwrap();
        assert_eq!(value, json!(["id", "!secret", {"?meta": ["x"]}]));
        let back: FilterSpec = serde_json::from_value(value).unwrap();
        assert_eq!(back, f);
    }
}
