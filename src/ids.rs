use std::fmt::{Display, Formatter};

use ulid::Ulid;

use crate::binder::HeaderLookup;

const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Per-dispatch identifier, recorded on the request span and echoed back
/// as `X-Request-Id`.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(pub Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Reuse the caller's `X-Request-Id` when it is a valid ULID, otherwise
    /// start a fresh one.
    pub fn from_headers(headers: &dyn HeaderLookup) -> Self {
        headers
            .get_header(REQUEST_ID_HEADER)
            .and_then(|raw| Ulid::from_string(raw.trim()).ok())
            .map_or_else(Self::new, Self)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::CgiHeaders;

    #[test]
    fn test_reuses_valid_inbound_id() {
        let id = RequestId::new();
        let headers = CgiHeaders::from_pairs([("HTTP_X_REQUEST_ID", format!(" {id} "))]);
        assert_eq!(RequestId::from_headers(&headers), id);
    }

    #[test]
    fn test_invalid_or_missing_inbound_id_is_replaced() {
        let bad = CgiHeaders::from_pairs([("HTTP_X_REQUEST_ID", "not-a-ulid")]);
        let a = RequestId::from_headers(&bad);
        let b = RequestId::from_headers(&CgiHeaders::new());
        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 26);
    }
}
