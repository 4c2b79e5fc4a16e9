//! # CLI Module
//!
//! Command-line tooling for route files. Routes are declared in YAML or JSON
//! (see [`load_routes`](crate::routes::load_routes)) and every command
//! builds the same [`RouteIndex`](crate::router::RouteIndex) the dispatcher
//! would use.
//!
//! ## Commands
//!
//! ```bash
//! # Report every configuration error; exits non-zero if there are any
//! attrouter check routes.yaml
//!
//! # List routes in match order
//! attrouter routes routes.yaml
//!
//! # Resolve a request and print the handler and path variables
//! attrouter match routes.yaml GET /test/3/
//! attrouter match routes.yaml GET /api/test/3/ --config server.toml
//!
//! # Documentation export
//! attrouter docs routes.yaml --include-unpublished --pretty
//! ```
//!
//! Logs go to stderr so command output on stdout stays machine-readable.

mod commands;


pub use commands::{execute, run_cli, Cli, Commands};
