//! Error kinds surfaced by the routing pipeline.
//!
//! Two families exist and never mix:
//!
//! - [`ApiError`] is a request-time failure that becomes an HTTP response
//!   (`404`, `400`, `401`, `403`, `500`). Every variant carries a
//!   machine-readable code such as `idValueMaxExceeded`.
//! - [`ConfigurationError`] is a build-time failure raised while compiling
//!   route declarations. It aborts startup and is never shown to a caller.

use http::StatusCode;
use serde_json::{json, Value};
use std::fmt;

use crate::routes::{CustomType, PrimitiveType, Verb};

/// Request-time error with an HTTP status, a code and a human message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No route matches the verb and path.
    NotFound { code: String, message: String },
    /// A parameter is missing, malformed, out of range or fails its pattern.
    BadRequest { code: String, message: String },
    /// The pre-route hook rejected a missing or malformed credential.
    Unauthorized { code: String, message: String },
    /// The request is not allowed (e.g. plain HTTP when HTTPS is required).
    Forbidden { code: String, message: String },
    /// Anything raised by a handler that is not one of the above.
    ///
    /// `class` names the failure kind and is reported as the `error` field.
    Internal { class: String, message: String },
}

impl ApiError {
    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(code: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn forbidden(code: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Forbidden {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(class: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Internal {
            class: class.into(),
            message: message.into(),
        }
    }

    /// The default "no route" error.
    #[must_use]
    pub fn route_not_found() -> Self {
        Self::not_found("routeNotFound", "Resource could not be found")
    }

    /// Bad request attributed to a parameter: the code is `<name><reason>`.
    pub fn parameter(name: &str, reason: &str, message: impl Into<String>) -> Self {
        Self::bad_request(format!("{name}{reason}"), message)
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code (the error class for internal errors).
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            ApiError::NotFound { code, .. }
            | ApiError::BadRequest { code, .. }
            | ApiError::Unauthorized { code, .. }
            | ApiError::Forbidden { code, .. } => code,
            ApiError::Internal { class, .. } => class,
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            ApiError::NotFound { message, .. }
            | ApiError::BadRequest { message, .. }
            | ApiError::Unauthorized { message, .. }
            | ApiError::Forbidden { message, .. }
            | ApiError::Internal { message, .. } => message,
        }
    }

    /// Response body: `{"error": code, "errorDescription": message, "status": n}`.
    #[must_use]
    pub fn to_body(&self) -> Value {
        json!({
            "error": self.code(),
            "errorDescription": self.message(),
            "status": self.status().as_u16(),
        })
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {}",
            self.status().as_u16(),
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ApiError {}

/// Build-time error raised while compiling route declarations.
///
/// `route` fields hold a `VERB /template` label of the offending declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Two routes with the same verb share a structurally identical template.
    DuplicateRoute {
        verb: Verb,
        template: String,
        existing_handler: String,
        handler: String,
    },
    /// The path template cannot be parsed.
    InvalidTemplate { template: String, reason: String },
    /// A declared status code is outside `100..=999`.
    InvalidStatus { route: String, status: u16 },
    /// A `path_variable` parameter has no matching placeholder.
    UnknownPathVariable { route: String, name: String },
    /// Two parameters of one route share a name.
    DuplicateParameter { route: String, name: String },
    /// A custom type that decodes strings was declared on a non-string primitive.
    ConflictingTypes {
        route: String,
        name: String,
        primitive: PrimitiveType,
        custom: CustomType,
    },
    /// A pattern was declared on a parameter that is not string-like.
    PatternOnNonString {
        route: String,
        name: String,
        primitive: PrimitiveType,
    },
    /// A pattern reference did not resolve in the pattern registry.
    UnresolvedPattern {
        route: String,
        name: String,
        holder: String,
        property: String,
    },
    /// A pattern expression does not compile.
    InvalidPattern {
        route: String,
        name: String,
        pattern: String,
        reason: String,
    },
    /// The declared default is not compatible with the declared type.
    InvalidDefault {
        route: String,
        name: String,
        reason: String,
    },
    /// `min` is greater than `max`.
    InvalidBounds {
        route: String,
        name: String,
        min: f64,
        max: f64,
    },
    /// The response filter declaration is malformed.
    InvalidFilter { route: String, reason: String },
    /// A route names a handler that was never registered.
    UnknownHandler { route: String, handler: String },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::DuplicateRoute {
                verb,
                template,
                existing_handler,
                handler,
            } => write!(
                f,
                "Duplicate route {verb} {template}: '{handler}' conflicts with '{existing_handler}'"
            ),
            ConfigurationError::InvalidTemplate { template, reason } => {
                write!(f, "Invalid path template '{template}': {reason}")
            }
            ConfigurationError::InvalidStatus { route, status } => {
                write!(f, "Route {route} declares invalid status code {status}")
            }
            ConfigurationError::UnknownPathVariable { route, name } => write!(
                f,
                "Route {route} binds path variable '{name}' which is not a placeholder in its template"
            ),
            ConfigurationError::DuplicateParameter { route, name } => {
                write!(f, "Route {route} declares parameter '{name}' more than once")
            }
            ConfigurationError::ConflictingTypes {
                route,
                name,
                primitive,
                custom,
            } => write!(
                f,
                "Route {route} parameter '{name}' declares conflicting types {primitive} and {custom}"
            ),
            ConfigurationError::PatternOnNonString {
                route,
                name,
                primitive,
            } => write!(
                f,
                "Route {route} parameter '{name}' declares a pattern but has type {primitive}"
            ),
            ConfigurationError::UnresolvedPattern {
                route,
                name,
                holder,
                property,
            } => write!(
                f,
                "Route {route} parameter '{name}' references pattern '{holder}::{property}' which is not registered"
            ),
            ConfigurationError::InvalidPattern {
                route,
                name,
                pattern,
                reason,
            } => write!(
                f,
                "Route {route} parameter '{name}' has invalid pattern '{pattern}': {reason}"
            ),
            ConfigurationError::InvalidDefault {
                route,
                name,
                reason,
            } => write!(
                f,
                "Route {route} parameter '{name}' has invalid default: {reason}"
            ),
            ConfigurationError::InvalidBounds {
                route,
                name,
                min,
                max,
            } => write!(
                f,
                "Route {route} parameter '{name}' has min {min} greater than max {max}"
            ),
            ConfigurationError::InvalidFilter { route, reason } => {
                write!(f, "Route {route} has invalid response filter: {reason}")
            }
            ConfigurationError::UnknownHandler { route, handler } => {
                write!(f, "Route {route} names unregistered handler '{handler}'")
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}
