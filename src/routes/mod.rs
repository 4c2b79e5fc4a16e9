//! # Route Declarations
//!
//! Plain data describing endpoints, and the build step that checks them.
//!
//! A [`RouteDefinition`] names a verb, a path template, the handler that
//! serves it, its declared parameters and an optional response filter.
//! Declarations come from code (the builder methods on the types here) or
//! from a YAML/JSON file ([`load_routes`]). Before they are inserted into
//! the [`RouteIndex`](crate::router::RouteIndex) each one goes through
//! [`compile_route`], which parses the template, resolves pattern
//! references against a [`PatternRegistry`] and rejects inconsistent
//! declarations with a [`ConfigurationError`](crate::error::ConfigurationError).
//!
//! ```rust
//! use attrouter::routes::{ParameterSpec, RouteDefinition};
//!
//! let route = RouteDefinition::get("/test/{id}/", "get_test")
//!     .param(ParameterSpec::path("id").int().min(0.0).max(4.0))
//!     .param(ParameterSpec::query("name").pattern(r"/^[\w]+$/").default_value("john"));
//! assert_eq!(route.status_code(), http::StatusCode::OK);
//! ```

mod build;
mod load;
mod patterns;
mod template;
mod types;

pub use build::{compile_route, CompiledParameter, CompiledRoute};
pub use load::{load_routes, parse_routes, render_routes, save_routes, RouteFormat};
pub use patterns::{compile_pattern, PatternRegistry};
pub use template::{split_path, PathTemplate, Segment, MAX_INLINE_SEGMENTS};
pub use types::*;
