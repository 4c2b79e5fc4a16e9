//! # Dispatcher Module
//!
//! Runs one request through the whole pipeline and always produces an
//! [`ApiResponse`].
//!
//! ## Request Flow
//!
//! 1. Reject plain HTTP when HTTPS is required (`403 httpsRequired`)
//! 2. Strip the configured path prefix and the query string
//! 3. Match verb and path against the current [`SharedRouteIndex`] snapshot
//!    (`404 routeNotFound`)
//! 4. Run the pre-route hook if it applies to the route
//! 5. Bind and validate parameters (`400 <name><Reason>`)
//! 6. Invoke the handler registered under the route's handler name
//! 7. Apply the route's response filter
//! 8. Add the `time` key when configured
//!
//! ## Handler Registration
//!
//! ```rust
//! use attrouter::config::ServerConfig;
//! use attrouter::dispatcher::{DispatchRequest, Dispatcher};
//! use attrouter::router::RouteIndex;
//! use attrouter::routes::{ParameterSpec, RouteDefinition};
//! use serde_json::json;
//!
//! let index = RouteIndex::build(vec![
//!     RouteDefinition::get("/pets/{id}", "get_pet").param(ParameterSpec::path("id").int()),
//! ])
//! .unwrap();
//!
//! let mut dispatcher = Dispatcher::new(index, ServerConfig::default());
//! dispatcher.register_handler("get_pet", |call| {
//!     Ok(json!({ "id": call.arg("id") }))
//! });
//! dispatcher.verify().unwrap();
//!
//! let response = dispatcher.dispatch(DispatchRequest::new("GET", "/pets/7"));
//! assert_eq!(response.status, 200);
//! assert_eq!(response.body, json!({ "id": 7 }));
//! ```
//!
//! ## Error Handling
//!
//! - Errors returned by handlers keep their status and code
//! - Handler panics are caught and return 500 responses
//! - A route whose handler was never registered fails [`Dispatcher::verify`]

mod core;
mod shared;

pub use core::{ApiResponse, DispatchRequest, Dispatcher, Handler, HandlerCall};
pub use shared::SharedRouteIndex;
