use http::StatusCode;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

use super::patterns::{compile_pattern, PatternRegistry};
use super::template::PathTemplate;
use super::types::{ParameterSource, ParameterSpec, PatternSource, RouteDefinition};
use crate::binder::apply_custom_type;
use crate::error::ConfigurationError;
use crate::filter::FilterSpec;
use crate::validator;

/// A parameter declaration with its pattern resolved and compiled.
#[derive(Debug, Clone)]
pub struct CompiledParameter {
    pub spec: ParameterSpec,
    pub pattern: Option<Regex>,
    /// Expression as declared, or as resolved from the pattern registry.
    pub pattern_source: Option<String>,
}

impl CompiledParameter {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.spec.name
    }
}

/// A route definition that passed build-time checks.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    pub definition: RouteDefinition,
    pub template: PathTemplate,
    pub parameters: Vec<CompiledParameter>,
    status: StatusCode,
}

impl CompiledRoute {
    #[inline]
    #[must_use]
    pub fn handler(&self) -> &str {
        &self.definition.handler
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[inline]
    #[must_use]
    pub fn filter(&self) -> Option<&FilterSpec> {
        self.definition.filter.as_ref()
    }

    #[must_use]
    pub fn label(&self) -> String {
        self.definition.label()
    }
}

/// Check a route declaration and compile its patterns.
///
/// Every failure here is a programmer error in the declaration and is
/// reported as a [`ConfigurationError`].
pub fn compile_route(
    definition: RouteDefinition,
    patterns: &PatternRegistry,
) -> Result<CompiledRoute, ConfigurationError> {
    let template = PathTemplate::parse(&definition.path)?;
    let route = definition.label();

    if let Some(status) = definition.status {
        if StatusCode::from_u16(status).is_err() {
            return Err(ConfigurationError::InvalidStatus { route, status });
        }
    }

    let placeholders: HashSet<&str> = template.placeholder_names().collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut parameters = Vec::with_capacity(definition.parameters.len());

    for spec in &definition.parameters {
        if !seen.insert(spec.name.as_str()) {
            return Err(ConfigurationError::DuplicateParameter {
                route,
                name: spec.name.clone(),
            });
        }
        if spec.source == ParameterSource::PathVariable
            && !placeholders.contains(spec.name.as_str())
        {
            return Err(ConfigurationError::UnknownPathVariable {
                route,
                name: spec.name.clone(),
            });
        }
        parameters.push(compile_parameter(&route, spec, patterns)?);
    }

    if let Some(filter) = &definition.filter {
        filter
            .validate()
            .map_err(|e| ConfigurationError::InvalidFilter {
                route: route.clone(),
                reason: e.to_string(),
            })?;
    }

    debug!(
        route = %route,
        handler = %definition.handler,
        parameters = parameters.len(),
        "Route compiled"
    );

    let status = definition.status_code();
    Ok(CompiledRoute {
        definition,
        template,
        parameters,
        status,
    })
}

fn compile_parameter(
    route: &str,
    spec: &ParameterSpec,
    patterns: &PatternRegistry,
) -> Result<CompiledParameter, ConfigurationError> {
    let name = spec.name.clone();

    if let Some(custom) = spec.custom_type {
        if !spec.primitive.is_string_like() {
            return Err(ConfigurationError::ConflictingTypes {
                route: route.to_string(),
                name,
                primitive: spec.primitive,
                custom,
            });
        }
    }

    if let (Some(min), Some(max)) = (spec.min, spec.max) {
        if min > max {
            return Err(ConfigurationError::InvalidBounds {
                route: route.to_string(),
                name,
                min,
                max,
            });
        }
    }

    if let Some(default) = spec.default.as_ref().filter(|d| !d.is_null()) {
        let invalid_default = |reason: String| ConfigurationError::InvalidDefault {
            route: route.to_string(),
            name: spec.name.clone(),
            reason,
        };
        let value = validator::cast(spec.primitive, default).ok_or_else(|| {
            invalid_default(format!("{default} is not a valid {}", spec.primitive))
        })?;
        validator::check_allowed(spec, &value)
            .map_err(|e| invalid_default(e.message().to_string()))?;
        if let Some(custom) = spec.custom_type {
            apply_custom_type(&spec.name, custom, value)
                .map_err(|e| invalid_default(e.message().to_string()))?;
        }
    }

    let pattern = match &spec.pattern {
        None => None,
        Some(source) => {
            if !spec.primitive.is_string_like() {
                return Err(ConfigurationError::PatternOnNonString {
                    route: route.to_string(),
                    name,
                    primitive: spec.primitive,
                });
            }
            let expression = resolve_pattern(route, spec, source, patterns)?;
            let regex = compile_pattern(&expression).map_err(|e| {
                ConfigurationError::InvalidPattern {
                    route: route.to_string(),
                    name: spec.name.clone(),
                    pattern: expression.clone(),
                    reason: e.to_string(),
                }
            })?;
            Some((regex, expression))
        }
    };
    let (pattern, pattern_source) = pattern.unzip();

    Ok(CompiledParameter {
        spec: spec.clone(),
        pattern,
        pattern_source,
    })
}

fn resolve_pattern(
    route: &str,
    spec: &ParameterSpec,
    source: &PatternSource,
    patterns: &PatternRegistry,
) -> Result<String, ConfigurationError> {
    match source {
        PatternSource::Regex(expression) => Ok(expression.clone()),
        PatternSource::Reference { holder, property } => {
            let property = property.as_deref().unwrap_or(&spec.name);
            patterns
                .resolve(holder, property)
                .ok_or_else(|| ConfigurationError::UnresolvedPattern {
                    route: route.to_string(),
                    name: spec.name.clone(),
                    holder: holder.clone(),
                    property: property.to_string(),
                })
        }
    }
}
