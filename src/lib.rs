//! # attrouter
//!
//! **attrouter** is a declaration-driven HTTP routing core: routes carry
//! their verb, path template, status code, parameter bindings and response
//! filter as data, and a dispatcher turns requests into handler calls with
//! validated arguments.
//!
//! ## Overview
//!
//! Routes are declared in code with the builders in [`routes`] or loaded
//! from a YAML/JSON file. At startup they are compiled into a
//! [`RouteIndex`](router::RouteIndex); any inconsistency in a declaration is a
//! [`ConfigurationError`](error::ConfigurationError) and stops the build. At
//! request time the [`Dispatcher`](dispatcher::Dispatcher) matches, binds,
//! validates, invokes and shapes, and every outcome is an
//! [`ApiResponse`](dispatcher::ApiResponse).
//!
//! ## Architecture
//!
//! - **[`routes`]** - Route declarations, templates, named patterns, route files
//! - **[`router`]** - Segment trie with literal-first matching and path variables
//! - **[`binder`]** - Request context, parameter sourcing and custom-type decoding
//! - **[`validator`]** - Required check, primitive coercion, bounds and patterns
//! - **[`filter`]** - Recursive include/exclude projection of handler results
//! - **[`middleware`]** - Pre-route hooks such as bearer-token extraction
//! - **[`dispatcher`]** - Handler registry and the per-request pipeline
//! - **[`server`]** - `http` crate adapters with JSON/XML serialization
//! - **[`docs`]** - Documentation export grouped by controller
//! - **[`config`]** / **[`logging`]** - TOML/env settings and tracing setup
//! - **[`cli`]** - `attrouter check | routes | match | docs`
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as server::serve_http
//!     participant Dispatcher
//!     participant Index as RouteIndex
//!     participant Hook as PreRouteHook
//!     participant Binder as ParameterBinder
//!     participant Handler
//!     participant Filter as FilterSpec
//!
//!     Client->>Server: GET /test/3/?name=Ann
//!     Server->>Dispatcher: dispatch(DispatchRequest)
//!     Dispatcher->>Dispatcher: HTTPS check, strip prefix
//!     Dispatcher->>Index: lookup(GET, ["test", "3"])
//!     alt No Route Match
//!         Dispatcher-->>Client: 404 routeNotFound
//!     end
//!     Index-->>Dispatcher: MatchResult {route, id="3"}
//!     Dispatcher->>Hook: before_route (authorized routes)
//!     alt Missing or malformed token
//!         Hook-->>Client: 401 tokenRequired
//!     end
//!     Dispatcher->>Binder: bind(route, path vars, context)
//!     alt Validation Failed
//!         Binder-->>Client: 400 idValueMaxExceeded
//!     end
//!     Binder-->>Dispatcher: {id: 3, name: "Ann"}
//!     Dispatcher->>Handler: handle(HandlerCall)
//!     alt Handler Panics
//!         Dispatcher-->>Client: 500 HandlerPanic
//!     end
//!     Handler-->>Dispatcher: {"id": "<3>", "name": "Ann"}
//!     Dispatcher->>Filter: apply
//!     Dispatcher-->>Server: ApiResponse 200
//!     Server-->>Client: JSON or XML body
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use attrouter::config::ServerConfig;
//! use attrouter::dispatcher::{DispatchRequest, Dispatcher};
//! use attrouter::filter::FilterSpec;
//! use attrouter::router::RouteIndex;
//! use attrouter::routes::{ParameterSpec, RouteDefinition};
//! use serde_json::json;
//!
//! let index = RouteIndex::build(vec![RouteDefinition::get("/test/{id}/", "get_test")
//!     .param(ParameterSpec::path("id").int().min(0.0).max(4.0))
//!     .param(ParameterSpec::query("name").pattern(r"/^[\w]+$/").default_value("john"))
//!     .with_filter(FilterSpec::from_keys(["name", "id"]).unwrap())])
//! .unwrap();
//!
//! let mut dispatcher = Dispatcher::new(index, ServerConfig::default());
//! dispatcher.register_handler("get_test", |call| {
//!     Ok(json!({
//!         "id": format!("<{}>", call.arg("id").unwrap()),
//!         "name": call.arg("name"),
//!     }))
//! });
//!
//! let ok = dispatcher.dispatch(DispatchRequest::new("GET", "/test/3/?name=Ann"));
//! assert_eq!(ok.status, 200);
//! assert_eq!(ok.body, json!({"id": "<3>", "name": "Ann"}));
//!
//! let rejected = dispatcher.dispatch(DispatchRequest::new("GET", "/test/9/"));
//! assert_eq!(rejected.status, 400);
//! assert_eq!(rejected.body["error"], "idValueMaxExceeded");
//! ```
//!
//! ## Runtime Considerations
//!
//! The dispatcher holds no per-request state and is shared behind an `Arc`.
//! The route index can be replaced wholesale through
//! [`SharedRouteIndex`](dispatcher::SharedRouteIndex) while requests are in
//! flight; readers keep the snapshot they started with.

pub mod binder;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod docs;
pub mod error;
pub mod filter;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod server;
pub mod validator;

pub use error::{ApiError, ConfigurationError};
pub use routes::{load_routes, RouteDefinition};
