use http::HeaderMap;
use std::collections::HashMap;

/// Header names that CGI-style servers expose without the `HTTP_` prefix.
const UNPREFIXED: [&str; 3] = ["CONTENT_TYPE", "CONTENT_LENGTH", "CONTENT_MD5"];

/// Case-insensitive header access used by the binder and the pre-route hook.
///
/// Callers pass the header name as it appears on the wire (`Content-Type`,
/// `X-Api-Key`); implementations normalize it for their own storage.
pub trait HeaderLookup: Send + Sync {
    fn get_header(&self, name: &str) -> Option<String>;
}

impl HeaderLookup for HeaderMap {
    fn get_header(&self, name: &str) -> Option<String> {
        let value = self
            .get(name)
            .or_else(|| self.get(name.replace('_', "-").as_str()))?;
        value.to_str().ok().map(str::to_string)
    }
}

/// Server-variable key for a header name: `X-Api-Key` becomes
/// `HTTP_X_API_KEY`, `Content-Type` becomes `CONTENT_TYPE`.
///
/// Names that already carry the `HTTP_` prefix are accepted as-is.
#[must_use]
pub fn cgi_key(name: &str) -> String {
    let upper = name.trim().to_ascii_uppercase().replace('-', "_");
    let bare = upper.strip_prefix("HTTP_").unwrap_or(&upper);
    if UNPREFIXED.contains(&bare) {
        bare.to_string()
    } else {
        format!("HTTP_{bare}")
    }
}

/// Headers held as CGI server variables (`HTTP_ACCEPT`, `CONTENT_TYPE`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CgiHeaders {
    vars: HashMap<String, String>,
}

impl CgiHeaders {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from server variables; keys are normalized with [`cgi_key`].
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut headers = Self::new();
        for (k, v) in pairs {
            headers.insert(k.as_ref(), v);
        }
        headers
    }

    /// Set a header by wire name or server-variable name.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.vars.insert(cgi_key(name), value.into());
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl HeaderLookup for CgiHeaders {
    fn get_header(&self, name: &str) -> Option<String> {
        self.vars.get(&cgi_key(name)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_cgi_key_normalization() {
        assert_eq!(cgi_key("X-Api-Key"), "HTTP_X_API_KEY");
        assert_eq!(cgi_key("content-type"), "CONTENT_TYPE");
        assert_eq!(cgi_key("Content-Length"), "CONTENT_LENGTH");
        assert_eq!(cgi_key("Content-MD5"), "CONTENT_MD5");
        assert_eq!(cgi_key("HTTP_AUTHORIZATION"), "HTTP_AUTHORIZATION");
        assert_eq!(cgi_key("http_content_type"), "CONTENT_TYPE");
    }

    #[test]
    fn test_cgi_headers_lookup() {
        let headers = CgiHeaders::from_pairs([
            ("HTTP_X_API_KEY", "secret"),
            ("CONTENT_TYPE", "application/json"),
        ]);
        assert_eq!(headers.get_header("x-api-key").as_deref(), Some("secret"));
        assert_eq!(
            headers.get_header("Content-Type").as_deref(),
            Some("application/json")
        );
        assert_eq!(headers.get_header("Accept"), None);
    }

    #[test]
    fn test_header_map_lookup_is_case_insensitive() {
        let mut map = HeaderMap::new();
        map.insert("x-api-key", HeaderValue::from_static("secret"));
        assert_eq!(map.get_header("X-Api-Key").as_deref(), Some("secret"));
        assert_eq!(map.get_header("x_api_key").as_deref(), Some("secret"));
        assert_eq!(map.get_header("Authorization"), None);
    }
}
