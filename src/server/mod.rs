//! # Server Module
//!
//! Adapters between `http` request/response types and the dispatcher.
//! No socket handling lives here; any HTTP stack that can produce an
//! `http::Request<Vec<u8>>` can call [`serve_http`].
//!
//! ```rust
//! use attrouter::config::ServerConfig;
//! use attrouter::dispatcher::Dispatcher;
//! use attrouter::router::RouteIndex;
//! use attrouter::routes::RouteDefinition;
//! use attrouter::server::serve_http;
//! use serde_json::json;
//!
//! let index = RouteIndex::build(vec![RouteDefinition::get("/ping", "ping")]).unwrap();
//! let mut dispatcher = Dispatcher::new(index, ServerConfig::default());
//! dispatcher.register_handler("ping", |_| Ok(json!({ "pong": true })));
//!
//! let req = http::Request::builder()
//!     .uri("/ping")
//!     .header("Accept", "application/xml")
//!     .body(Vec::new())
//!     .unwrap();
//! let res = serve_http(&dispatcher, req);
//! assert_eq!(res.status(), 200);
//! assert!(String::from_utf8_lossy(res.body()).contains("<pong>true</pong>"));
//! ```

mod request;
mod response;

pub use request::into_dispatch_request;
pub use response::{into_http_response, to_json, to_xml, ResponseFormat, SerializeError};

use crate::dispatcher::Dispatcher;

/// Dispatch an HTTP request and render the result in the negotiated format.
pub fn serve_http(dispatcher: &Dispatcher, req: http::Request<Vec<u8>>) -> http::Response<Vec<u8>> {
    let format = ResponseFormat::negotiate(req.headers());
    let response = dispatcher.dispatch(into_dispatch_request(req));
    into_http_response(response, format)
}
