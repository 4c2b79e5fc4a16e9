//! # Router Module
//!
//! Route resolution for declared endpoints.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling route declarations into a [`RouteIndex`] (a segment trie keyed by verb)
//! - Matching a verb and request path against it with [`RequestMatcher`]
//! - Capturing path variables in template order
//!
//! ## Matching rules
//!
//! - Literal segments win over placeholders at the same depth; the matcher
//!   backtracks into the placeholder branch when the literal one dead-ends.
//! - Trailing slashes are significant: `/foo` and `/foo/` are different routes.
//! - A placeholder never matches an empty segment.
//! - The empty path is treated as `/`; query strings are ignored.
//! - Structurally identical templates for the same verb are rejected at build time.
//!
//! ## Example
//!
//! ```rust
//! use attrouter::router::{RequestMatcher, RouteIndex};
//! use attrouter::routes::RouteDefinition;
//!
//! let index = RouteIndex::build(vec![
//!     RouteDefinition::get("/foo/{a}", "foo_a"),
//!     RouteDefinition::get("/foo/bar", "foo_bar"),
//! ])
//! .unwrap();
//!
//! let matcher = RequestMatcher::new(&index);
//! let m = matcher.match_request("GET", "/foo/bar").unwrap();
//! assert_eq!(m.route.handler(), "foo_bar");
//!
//! let m = matcher.match_request("GET", "/foo/42?x=1").unwrap();
//! assert_eq!(m.get("a"), Some("42"));
//! ```

mod core;
mod radix;

pub use core::{
    normalize_path, strip_path_prefix, MatchResult, ParamVec, RequestMatcher, MAX_INLINE_PARAMS,
};
pub use radix::RouteIndex;
