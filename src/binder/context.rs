use once_cell::unsync::OnceCell;
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

use super::headers::HeaderLookup;
use crate::error::ApiError;
use crate::routes::Verb;

/// Everything the binder reads from one request.
///
/// Query and body parameters are parsed on first access and cached in a
/// cell owned by this context, so a request never sees another request's
/// data and the body is parsed at most once.
pub struct RequestContext {
    verb: Verb,
    query: String,
    headers: Box<dyn HeaderLookup>,
    body: Vec<u8>,
    data: OnceCell<Result<Map<String, Value>, ApiError>>,
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("verb", &self.verb)
            .field("query", &self.query)
            .field("body_len", &self.body.len())
            .field("parsed", &self.data.get().is_some())
            .finish()
    }
}

impl RequestContext {
    pub fn new(
        verb: Verb,
        query: impl Into<String>,
        headers: Box<dyn HeaderLookup>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            verb,
            query: query.into(),
            headers,
            body,
            data: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn verb(&self) -> Verb {
        self.verb
    }

    #[must_use]
    pub fn query_string(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn headers(&self) -> &dyn HeaderLookup {
        self.headers.as_ref()
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.get_header(name)
    }

    /// Media type of the request without parameters, lowercased.
    #[must_use]
    pub fn content_type(&self) -> Option<String> {
        self.header("Content-Type").map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }

    /// Query-string parameters for GET/DELETE/OPTIONS, body parameters for
    /// POST/PUT/PATCH.
    pub fn request_data(&self) -> Result<&Map<String, Value>, ApiError> {
        self.data
            .get_or_init(|| {
                if self.verb.reads_body() {
                    parse_body(self.content_type().as_deref(), &self.body)
                } else {
                    Ok(parse_form(self.query.as_bytes()))
                }
            })
            .as_ref()
            .map_err(ApiError::clone)
    }

    /// Raw value of one query-or-body parameter.
    pub fn param(&self, name: &str) -> Result<Option<&Value>, ApiError> {
        Ok(self.request_data()?.get(name))
    }
}

fn parse_body(content_type: Option<&str>, body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    match content_type {
        Some("application/json") => {
            if body.iter().all(u8::is_ascii_whitespace) {
                return Ok(Map::new());
            }
            match serde_json::from_slice::<Value>(body) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(_) | Err(_) => {
                    debug!(body_len = body.len(), "Rejected JSON request body");
                    Err(ApiError::bad_request(
                        "jsonInputInvalid",
                        "Payload is not valid json",
                    ))
                }
            }
        }
        _ => Ok(parse_form(body)),
    }
}

/// Parse `application/x-www-form-urlencoded` data.
///
/// Later keys overwrite earlier ones; keys ending in `[]` collect into a list.
#[must_use]
pub fn parse_form(input: &[u8]) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in url::form_urlencoded::parse(input) {
        if let Some(list_key) = key.strip_suffix("[]") {
            let slot = map
                .entry(list_key.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            match slot {
                Value::Array(items) => items.push(Value::String(value.into_owned())),
                other => *other = Value::Array(vec![Value::String(value.into_owned())]),
            }
        } else {
            map.insert(key.into_owned(), Value::String(value.into_owned()));
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::CgiHeaders;
    use serde_json::json;

    fn ctx(verb: Verb, query: &str, content_type: Option<&str>, body: &str) -> RequestContext {
        let mut headers = CgiHeaders::new();
        if let Some(ct) = content_type {
            headers.insert("Content-Type", ct);
        }
        RequestContext::new(verb, query, Box::new(headers), body.as_bytes().to_vec())
    }

    #[test]
    fn test_get_reads_query_string() {
        let c = ctx(Verb::Get, "name=Ann&tag[]=a&tag[]=b", None, "ignored=1");
        assert_eq!(c.param("name").unwrap(), Some(&json!("Ann")));
        assert_eq!(c.param("tag").unwrap(), Some(&json!(["a", "b"])));
        assert_eq!(c.param("ignored").unwrap(), None);
    }

    #[test]
    fn test_post_reads_json_body() {
        let c = ctx(
            Verb::Post,
            "name=Query",
            Some("application/json; charset=utf-8"),
            r#"{"name": "Ann", "age": 31}"#,
        );
        assert_eq!(c.param("name").unwrap(), Some(&json!("Ann")));
        assert_eq!(c.param("age").unwrap(), Some(&json!(31)));
    }

    #[test]
    fn test_post_reads_form_body_by_default() {
        let c = ctx(Verb::Put, "", None, "name=Ann+Lee&id=3");
        assert_eq!(c.param("name").unwrap(), Some(&json!("Ann Lee")));
    }

    #[test]
    fn test_invalid_json_body() {
        let c = ctx(Verb::Patch, "", Some("application/json"), "{not json");
        assert_eq!(c.param("x").unwrap_err().code(), "jsonInputInvalid");
        let c = ctx(Verb::Post, "", Some("application/json"), "[1, 2]");
        assert_eq!(c.param("x").unwrap_err().code(), "jsonInputInvalid");
    }

    #[test]
    fn test_empty_json_body_is_empty_map() {
        let c = ctx(Verb::Post, "", Some("application/json"), "  ");
        assert!(c.request_data().unwrap().is_empty());
    }

    #[test]
    fn test_body_parsed_once() {
        let c = ctx(Verb::Post, "", Some("application/json"), r#"{"a": 1}"#);
        let first = c.request_data().unwrap() as *const _;
        let second = c.request_data().unwrap() as *const _;
        assert_eq!(first, second);
    }
}
