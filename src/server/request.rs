use http::Request;
use tracing::debug;

use crate::dispatcher::DispatchRequest;

/// Whether the request arrived over TLS, either directly or behind a proxy
/// that sets `X-Forwarded-Proto`.
fn is_secure(req: &http::request::Parts) -> bool {
    if req.uri.scheme_str() == Some("https") {
        return true;
    }
    req.headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}

/// Convert an `http::Request` into a [`DispatchRequest`].
///
/// The header map is moved into the request as-is and the target keeps its
/// query string.
pub fn into_dispatch_request(req: Request<Vec<u8>>) -> DispatchRequest {
    let (parts, body) = req.into_parts();
    let secure = is_secure(&parts);
    let target = parts
        .uri
        .path_and_query()
        .map_or_else(|| "/".to_string(), |pq| pq.as_str().to_string());

    debug!(
        method = %parts.method,
        target = %target,
        secure,
        body_len = body.len(),
        "Converted HTTP request"
    );

    DispatchRequest {
        method: parts.method.as_str().to_string(),
        target,
        secure,
        headers: Box::new(parts.headers),
        body,
    }
}
