use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::PreRouteHook;
use crate::binder::RequestContext;
use crate::error::ApiError;
use crate::routes::CompiledRoute;

static BEARER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^bearer:?\s+(.+)$").expect("valid bearer regex"));

/// Extension key under which the extracted token is passed to handlers.
pub const TOKEN_EXTENSION: &str = "token";

type TokenVerifier = dyn Fn(&str, &CompiledRoute) -> Result<(), ApiError> + Send + Sync;

/// Bearer-token check for routes declared with `requires_authorization`.
///
/// Only checks that a well-formed token is present unless a verifier is
/// installed with [`BearerAuthorization::with_verifier`].
#[derive(Clone, Default)]
pub struct BearerAuthorization {
    verifier: Option<Arc<TokenVerifier>>,
}

impl fmt::Debug for BearerAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuthorization")
            .field("verifier", &self.verifier.is_some())
            .finish()
    }
}

impl BearerAuthorization {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `verifier` on every extracted token; its error is returned as-is.
    #[must_use]
    pub fn with_verifier<F>(verifier: F) -> Self
    where
        F: Fn(&str, &CompiledRoute) -> Result<(), ApiError> + Send + Sync + 'static,
    {
        Self {
            verifier: Some(Arc::new(verifier)),
        }
    }

    /// Token from an `Authorization` header value.
    pub fn extract_token(header: Option<&str>) -> Result<String, ApiError> {
        let header = header.map(str::trim).unwrap_or_default();
        if header.is_empty() {
            return Err(ApiError::unauthorized("tokenRequired", "Token required"));
        }
        BEARER
            .captures(header)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                ApiError::unauthorized("tokenFormatInvalid", "Token invalid, expects bearer token")
            })
    }
}

impl PreRouteHook for BearerAuthorization {
    fn applies_to(&self, route: &CompiledRoute) -> bool {
        route.definition.requires_authorization
    }

    fn before_route(
        &self,
        route: &CompiledRoute,
        ctx: &RequestContext,
        extensions: &mut Map<String, Value>,
    ) -> Result<(), ApiError> {
        let token = Self::extract_token(ctx.header("Authorization").as_deref()).inspect_err(|e| {
            debug!(handler_name = %route.handler(), error_code = %e.code(), "Authorization rejected");
        })?;

        if let Some(verify) = &self.verifier {
            verify(&token, route)?;
        }

        extensions.insert(TOKEN_EXTENSION.to_string(), Value::String(token));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::CgiHeaders;
    use crate::router::RouteIndex;
    use crate::routes::{RouteDefinition, Verb};
    use http::StatusCode;

    fn route(authorized: bool) -> std::sync::Arc<CompiledRoute> {
        let mut def = RouteDefinition::get("/me", "me");
        if authorized {
            def = def.authorized();
        }
        let index = RouteIndex::build(vec![def]).unwrap();
        std::sync::Arc::clone(&index.routes()[0])
    }

    fn ctx(auth: Option<&str>) -> RequestContext {
        let mut headers = CgiHeaders::new();
        if let Some(value) = auth {
            headers.insert("Authorization", value);
        }
        RequestContext::new(Verb::Get, "", Box::new(headers), Vec::new())
    }

    #[test]
    fn test_extract_token_forms() {
        assert_eq!(BearerAuthorization::extract_token(Some("Bearer abc")).unwrap(), "abc");
        assert_eq!(BearerAuthorization::extract_token(Some("bearer: abc.def")).unwrap(), "abc.def");
        assert_eq!(BearerAuthorization::extract_token(Some("  BEARER   x  ")).unwrap(), "x");
        assert_eq!(
            BearerAuthorization::extract_token(None).unwrap_err().code(),
            "tokenRequired"
        );
        assert_eq!(
            BearerAuthorization::extract_token(Some("Basic dXNlcg==")).unwrap_err().code(),
            "tokenFormatInvalid"
        );
    }

    #[test]
    fn test_applies_only_to_authorized_routes() {
        let hook = BearerAuthorization::new();
        assert!(hook.applies_to(&route(true)));
        assert!(!hook.applies_to(&route(false)));
    }

    #[test]
    fn test_token_stored_in_extensions() {
        let hook = BearerAuthorization::new();
        let mut ext = Map::new();
        hook.before_route(&route(true), &ctx(Some("Bearer t0k")), &mut ext)
            .unwrap();
        assert_eq!(ext.get(TOKEN_EXTENSION), Some(&Value::String("t0k".into())));

        let err = hook.before_route(&route(true), &ctx(None), &mut Map::new()).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_verifier_error_propagates() {
        let hook = BearerAuthorization::with_verifier(|token, _route| {
            if token == "good" {
                Ok(())
            } else {
                Err(ApiError::forbidden("tokenRejected", "Token not accepted"))
            }
        });
        assert!(hook
            .before_route(&route(true), &ctx(Some("Bearer good")), &mut Map::new())
            .is_ok());
        let err = hook
            .before_route(&route(true), &ctx(Some("Bearer bad")), &mut Map::new())
            .unwrap_err();
        assert_eq!(err.code(), "tokenRejected");
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }
}
