use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::filter::FilterSpec;

/// HTTP verbs a route can be declared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Verb {
    pub const ALL: [Verb; 6] = [
        Verb::Get,
        Verb::Post,
        Verb::Put,
        Verb::Patch,
        Verb::Delete,
        Verb::Options,
    ];

    /// Success status used when a route does not declare one.
    #[must_use]
    pub fn default_status(self) -> StatusCode {
        match self {
            Verb::Post => StatusCode::CREATED,
            _ => StatusCode::OK,
        }
    }

    /// Whether `query_or_body` parameters are read from the request body.
    #[must_use]
    pub fn reads_body(self) -> bool {
        matches!(self, Verb::Post | Verb::Put | Verb::Patch)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Options => "OPTIONS",
        }
    }

    #[must_use]
    pub fn as_method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Patch => Method::PATCH,
            Verb::Delete => Method::DELETE,
            Verb::Options => Method::OPTIONS,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a method token is not one of the supported verbs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedVerb(pub String);

impl fmt::Display for UnsupportedVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported HTTP verb '{}'", self.0)
    }
}

impl std::error::Error for UnsupportedVerb {}

impl FromStr for Verb {
    type Err = UnsupportedVerb;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verb::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnsupportedVerb(s.to_string()))
    }
}

impl TryFrom<&Method> for Verb {
    type Error = UnsupportedVerb;

    fn try_from(method: &Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

/// Where a parameter's raw value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterSource {
    /// Captured from a `{placeholder}` in the path template.
    PathVariable,
    /// Query string for GET/DELETE/OPTIONS, request body for POST/PUT/PATCH.
    QueryOrBody,
    /// Request header, looked up case-insensitively.
    Header,
}

impl fmt::Display for ParameterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterSource::PathVariable => write!(f, "pathVariable"),
            ParameterSource::QueryOrBody => write!(f, "requestParam"),
            ParameterSource::Header => write!(f, "requestHeader"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    #[default]
    String,
    #[serde(alias = "integer")]
    Int,
    #[serde(alias = "number", alias = "double")]
    Float,
    #[serde(alias = "boolean")]
    Bool,
    Mixed,
}

impl PrimitiveType {
    /// Types a regex pattern may be applied to.
    #[must_use]
    pub fn is_string_like(self) -> bool {
        matches!(self, PrimitiveType::String | PrimitiveType::Mixed)
    }

    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, PrimitiveType::Int | PrimitiveType::Float)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrimitiveType::String => "string",
            PrimitiveType::Int => "int",
            PrimitiveType::Float => "float",
            PrimitiveType::Bool => "bool",
            PrimitiveType::Mixed => "mixed",
        };
        f.write_str(s)
    }
}

/// Secondary check or decode applied after the primitive cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomType {
    Email,
    #[serde(alias = "uri")]
    Url,
    Ip,
    Mac,
    Domain,
    Json,
    Xml,
    Base64,
}

impl fmt::Display for CustomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CustomType::Email => "email",
            CustomType::Url => "url",
            CustomType::Ip => "ip",
            CustomType::Mac => "mac",
            CustomType::Domain => "domain",
            CustomType::Json => "json",
            CustomType::Xml => "xml",
            CustomType::Base64 => "base64",
        };
        f.write_str(s)
    }
}

/// A regex given inline or a reference into the
/// [`PatternRegistry`](super::PatternRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternSource {
    Regex(String),
    Reference {
        holder: String,
        /// Defaults to the parameter name.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        property: Option<String>,
    },
}

fn default_true() -> bool {
    true
}

fn is_true(v: &bool) -> bool {
    *v
}

/// Declaration of one handler argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub source: ParameterSource,
    #[serde(rename = "type", default)]
    pub primitive: PrimitiveType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_type: Option<CustomType>,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Inclusive bound: numeric value for numbers, codepoint length for strings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<PatternSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<Value>>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, source: ParameterSource) -> Self {
        Self {
            name: name.into(),
            source,
            primitive: PrimitiveType::String,
            custom_type: None,
            required: true,
            default: None,
            min: None,
            max: None,
            pattern: None,
            allowed_values: None,
        }
    }

    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, ParameterSource::PathVariable)
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self::new(name, ParameterSource::QueryOrBody)
    }

    pub fn header(name: impl Into<String>) -> Self {
        Self::new(name, ParameterSource::Header)
    }

    #[must_use]
    pub fn of_type(mut self, primitive: PrimitiveType) -> Self {
        self.primitive = primitive;
        self
    }

    #[must_use]
    pub fn int(self) -> Self {
        self.of_type(PrimitiveType::Int)
    }

    #[must_use]
    pub fn float(self) -> Self {
        self.of_type(PrimitiveType::Float)
    }

    #[must_use]
    pub fn boolean(self) -> Self {
        self.of_type(PrimitiveType::Bool)
    }

    #[must_use]
    pub fn custom(mut self, custom: CustomType) -> Self {
        self.custom_type = Some(custom);
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    #[must_use]
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    #[must_use]
    pub fn pattern(mut self, regex: impl Into<String>) -> Self {
        self.pattern = Some(PatternSource::Regex(regex.into()));
        self
    }

    #[must_use]
    pub fn pattern_ref(mut self, holder: impl Into<String>, property: Option<&str>) -> Self {
        self.pattern = Some(PatternSource::Reference {
            holder: holder.into(),
            property: property.map(str::to_string),
        });
        self
    }

    #[must_use]
    pub fn allowed(mut self, values: Vec<Value>) -> Self {
        self.allowed_values = Some(values);
        self
    }
}

/// Human documentation attached to a route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteDocs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_response: Option<Value>,
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// Immutable description of one endpoint.
///
/// Constructed when routes are declared and owned by the
/// [`RouteIndex`](crate::router::RouteIndex) once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub method: Verb,
    pub path: String,
    /// Name the handler is registered under in the dispatcher.
    pub handler: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterSpec>,
    /// Grouping label used by the documentation export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub requires_authorization: bool,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<RouteDocs>,
}

impl RouteDefinition {
    pub fn new(method: Verb, path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            handler: handler.into(),
            status: None,
            parameters: Vec::new(),
            filter: None,
            controller: None,
            requires_authorization: false,
            published: true,
            docs: None,
        }
    }

    pub fn get(path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self::new(Verb::Get, path, handler)
    }

    pub fn post(path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self::new(Verb::Post, path, handler)
    }

    pub fn put(path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self::new(Verb::Put, path, handler)
    }

    pub fn patch(path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self::new(Verb::Patch, path, handler)
    }

    pub fn delete(path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self::new(Verb::Delete, path, handler)
    }

    pub fn options(path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self::new(Verb::Options, path, handler)
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn param(mut self, param: ParameterSpec) -> Self {
        self.parameters.push(param);
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn in_controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    #[must_use]
    pub fn authorized(mut self) -> Self {
        self.requires_authorization = true;
        self
    }

    #[must_use]
    pub fn unpublished(mut self) -> Self {
        self.published = false;
        self
    }

    #[must_use]
    pub fn with_docs(mut self, docs: RouteDocs) -> Self {
        self.docs = Some(docs);
        self
    }

    /// Declared status, or the verb default.
    ///
    /// Declared codes are range-checked when the route is compiled.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.status
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or_else(|| self.method.default_status())
    }

    /// `VERB /template`, used in logs and configuration errors.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}
