use serde_json::{Map, Value};

use crate::binder::RequestContext;
use crate::error::ApiError;
use crate::routes::CompiledRoute;

/// Hook run after a route is matched and before its parameters are bound.
///
/// Returning an error ends the request with that error. Values written to
/// `extensions` are handed to the handler with its arguments.
pub trait PreRouteHook: Send + Sync {
    /// Whether the hook runs for `route`. Defaults to every route.
    fn applies_to(&self, _route: &CompiledRoute) -> bool {
        true
    }

    fn before_route(
        &self,
        route: &CompiledRoute,
        ctx: &RequestContext,
        extensions: &mut Map<String, Value>,
    ) -> Result<(), ApiError>;
}
