//! Dispatcher core module: the per-request pipeline.

use http::StatusCode;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn};

use super::shared::SharedRouteIndex;
use crate::binder::{BoundArguments, CgiHeaders, HeaderLookup, ParameterBinder, RequestContext};
use crate::config::ServerConfig;
use crate::error::{ApiError, ConfigurationError};
use crate::ids::RequestId;
use crate::middleware::{PreRouteHook, TOKEN_EXTENSION};
use crate::router::{strip_path_prefix, ParamVec, RequestMatcher, RouteIndex};
use crate::routes::{CompiledRoute, Verb};

/// Everything a handler receives for one invocation.
#[derive(Debug, Clone)]
pub struct HandlerCall {
    pub request_id: RequestId,
    pub route: Arc<CompiledRoute>,
    /// Bound and validated arguments in declaration order.
    pub args: BoundArguments,
    /// Raw captured path segments.
    pub path_variables: ParamVec,
    /// Values set by the pre-route hook (e.g. `token`).
    pub extensions: Map<String, Value>,
}

impl HandlerCall {
    #[inline]
    #[must_use]
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Bearer token extracted by [`BearerAuthorization`](crate::middleware::BearerAuthorization).
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.extensions.get(TOKEN_EXTENSION).and_then(Value::as_str)
    }
}

/// A route handler: bound arguments in, plain nested value out.
pub trait Handler: Send + Sync {
    fn handle(&self, call: &HandlerCall) -> Result<Value, ApiError>;
}

impl<F> Handler for F
where
    F: Fn(&HandlerCall) -> Result<Value, ApiError> + Send + Sync,
{
    fn handle(&self, call: &HandlerCall) -> Result<Value, ApiError> {
        self(call)
    }
}

/// Transport-neutral request handed to [`Dispatcher::dispatch`].
pub struct DispatchRequest {
    pub method: String,
    /// Path with optional query string, e.g. `/test/3/?name=Ann`.
    pub target: String,
    /// Whether the request arrived over TLS.
    pub secure: bool,
    pub headers: Box<dyn HeaderLookup>,
    pub body: Vec<u8>,
}

impl fmt::Debug for DispatchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchRequest")
            .field("method", &self.method)
            .field("target", &self.target)
            .field("secure", &self.secure)
            .field("body_len", &self.body.len())
            .finish()
    }
}

impl DispatchRequest {
    pub fn new(method: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            target: target.into(),
            secure: false,
            headers: Box::new(CgiHeaders::new()),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: impl HeaderLookup + 'static) -> Self {
        self.headers = Box::new(headers);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }
}

/// Final status and body of a dispatched request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
    pub request_id: RequestId,
}

impl ApiResponse {
    #[must_use]
    pub fn from_error(error: &ApiError, request_id: RequestId) -> Self {
        Self {
            status: error.status(),
            body: error.to_body(),
            request_id,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Matches, binds, invokes and shapes one request at a time.
///
/// The dispatcher holds no per-request state; it is shared across threads
/// behind an `Arc` and every call builds its own [`RequestContext`].
pub struct Dispatcher {
    index: SharedRouteIndex,
    handlers: HashMap<String, Arc<dyn Handler>>,
    hook: Option<Arc<dyn PreRouteHook>>,
    config: ServerConfig,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handlers: Vec<&String> = self.handlers.keys().collect();
        handlers.sort();
        f.debug_struct("Dispatcher")
            .field("routes", &self.index.load().len())
            .field("handlers", &handlers)
            .field("hook", &self.hook.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new(index: RouteIndex, config: ServerConfig) -> Self {
        Self::with_shared_index(SharedRouteIndex::new(index), config)
    }

    /// Dispatch against an index that may be swapped from elsewhere.
    #[must_use]
    pub fn with_shared_index(index: SharedRouteIndex, config: ServerConfig) -> Self {
        Self {
            index,
            handlers: HashMap::new(),
            hook: None,
            config,
        }
    }

    /// Register a closure under `name`, replacing any previous handler.
    pub fn register_handler<F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: Fn(&HandlerCall) -> Result<Value, ApiError> + Send + Sync + 'static,
    {
        self.register(name, handler)
    }

    /// Register any [`Handler`] implementation under `name`.
    pub fn register<H>(&mut self, name: &str, handler: H) -> &mut Self
    where
        H: Handler + 'static,
    {
        if self.handlers.insert(name.to_string(), Arc::new(handler)).is_some() {
            warn!(
                handler_name = %name,
                total_handlers = self.handlers.len(),
                "Replaced existing handler"
            );
        } else {
            info!(
                handler_name = %name,
                total_handlers = self.handlers.len(),
                "Handler registered successfully"
            );
        }
        self
    }

    pub fn set_pre_route_hook<H>(&mut self, hook: H) -> &mut Self
    where
        H: PreRouteHook + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Every route whose handler is not registered.
    #[must_use]
    pub fn missing_handlers(&self) -> Vec<ConfigurationError> {
        self.index
            .load()
            .routes()
            .iter()
            .filter(|r| !self.handlers.contains_key(r.handler()))
            .map(|r| ConfigurationError::UnknownHandler {
                route: r.label(),
                handler: r.handler().to_string(),
            })
            .collect()
    }

    /// Fail if any route names an unregistered handler.
    pub fn verify(&self) -> Result<(), ConfigurationError> {
        match self.missing_handlers().into_iter().next() {
            Some(e) => {
                error!(error = %e, "Dispatcher verification failed");
                Err(e)
            }
            None => Ok(()),
        }
    }

    /// Replace the route index for subsequent requests.
    pub fn swap_index(&self, index: RouteIndex) {
        self.index.store(index);
    }

    #[must_use]
    pub fn index(&self) -> Arc<RouteIndex> {
        self.index.load()
    }

    #[must_use]
    pub fn shared_index(&self) -> &SharedRouteIndex {
        &self.index
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run the full pipeline for one request.
    ///
    /// Never panics on handler failure; every outcome is an [`ApiResponse`].
    pub fn dispatch(&self, req: DispatchRequest) -> ApiResponse {
        let request_id = RequestId::from_headers(req.headers.as_ref());
        let span = info_span!(
            "dispatch",
            request_id = %request_id,
            method = %req.method,
            target = %req.target
        );
        let _entered = span.enter();
        let start = Instant::now();

        match self.run(req, request_id, start) {
            Ok(response) => response,
            Err(e) => {
                match e.status() {
                    StatusCode::INTERNAL_SERVER_ERROR => error!(
                        status = e.status().as_u16(),
                        error_code = %e.code(),
                        message = %e.message(),
                        "Request failed"
                    ),
                    _ => info!(
                        status = e.status().as_u16(),
                        error_code = %e.code(),
                        "Request rejected"
                    ),
                }
                ApiResponse::from_error(&e, request_id)
            }
        }
    }

    fn run(
        &self,
        req: DispatchRequest,
        request_id: RequestId,
        start: Instant,
    ) -> Result<ApiResponse, ApiError> {
        let DispatchRequest {
            method,
            target,
            secure,
            headers,
            body,
        } = req;

        if self.config.require_https && !secure {
            return Err(ApiError::forbidden("httpsRequired", "HTTPS is required"));
        }

        let target = target.split_once('#').map_or(target.as_str(), |(t, _)| t);
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        let path = strip_path_prefix(path, &self.config.path_prefix);

        let verb: Verb = method.parse().map_err(|e| {
            debug!(error = %e, "Unsupported verb");
            ApiError::route_not_found()
        })?;

        let index = self.index.load();
        let matched = RequestMatcher::new(&index)
            .match_verb(verb, path)
            .ok_or_else(ApiError::route_not_found)?;
        let route = Arc::clone(&matched.route);

        let ctx = RequestContext::new(verb, query, headers, body);

        let mut extensions = Map::new();
        if let Some(hook) = self.hook.as_ref().filter(|h| h.applies_to(&route)) {
            hook.before_route(&route, &ctx, &mut extensions)?;
        }

        let args = ParameterBinder::bind(&route, &matched.path_variables, &ctx)?;

        let handler = self.handlers.get(route.handler()).ok_or_else(|| {
            ApiError::internal(
                "UnknownHandler",
                format!("No handler registered under '{}'", route.handler()),
            )
        })?;

        let call = HandlerCall {
            request_id,
            route: Arc::clone(&route),
            args,
            path_variables: matched.path_variables,
            extensions,
        };

        info!(
            handler_name = %route.handler(),
            route_pattern = %route.template.as_str(),
            "Request dispatched to handler"
        );
        let execution_start = Instant::now();

        let value = match catch_unwind(AssertUnwindSafe(|| handler.handle(&call))) {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                warn!(
                    handler_name = %route.handler(),
                    status = e.status().as_u16(),
                    error_code = %e.code(),
                    "Handler returned error"
                );
                return Err(e);
            }
            Err(payload) => {
                let panic_message = panic_message(payload.as_ref());
                error!(
                    handler_name = %route.handler(),
                    panic_message = %panic_message,
                    "Handler panicked - CRITICAL"
                );
                return Err(ApiError::internal(
                    "HandlerPanic",
                    format!("Handler panicked: {panic_message}"),
                ));
            }
        };

        info!(
            handler_name = %route.handler(),
            execution_time_ms = execution_start.elapsed().as_millis() as u64,
            "Handler execution complete"
        );

        let mut body = match route.filter() {
            Some(filter) => filter.apply(value),
            None => value,
        };

        if self.config.add_request_time {
            if let Value::Object(map) = &mut body {
                map.insert(
                    "time".to_string(),
                    Value::from(start.elapsed().as_secs_f64()),
                );
            }
        }

        Ok(ApiResponse {
            status: route.status(),
            body,
            request_id,
        })
    }
}
