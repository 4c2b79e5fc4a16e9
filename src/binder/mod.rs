//! # Parameter Binding
//!
//! Produces handler arguments from a matched route and the request.
//!
//! - [`RequestContext`] holds one request's query string, headers and body,
//!   and parses query/body parameters once per request.
//! - [`HeaderLookup`] abstracts header access; it is implemented for
//!   [`http::HeaderMap`] and for CGI-style server variables ([`CgiHeaders`]).
//! - [`ParameterBinder`] walks the declared parameters and returns
//!   [`BoundArguments`] or the first [`ApiError`](crate::error::ApiError).
//! - Custom types (`email`, `url`, `ip`, `mac`, `domain`, `json`, `xml`,
//!   `base64`) are applied by [`apply_custom_type`].

mod context;
mod core;
mod decode;
mod headers;

pub use context::{parse_form, RequestContext};
pub use core::{BoundArguments, ParameterBinder};
pub use decode::{apply_custom_type, parse_xml};
pub use headers::{cgi_key, CgiHeaders, HeaderLookup};
