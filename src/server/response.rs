use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{Response, StatusCode};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::Value;
use std::fmt;
use tracing::error;

use crate::binder::HeaderLookup;
use crate::dispatcher::ApiResponse;
use crate::error::ApiError;

const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Body encoding chosen for a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Json,
    Xml,
}

impl ResponseFormat {
    /// XML when `application/xml` appears in `Accept` or `Content-Type`,
    /// JSON otherwise.
    pub fn negotiate(headers: &dyn HeaderLookup) -> Self {
        let wants_xml = ["Accept", "Content-Type"].iter().any(|name| {
            headers
                .get_header(name)
                .is_some_and(|v| v.to_ascii_lowercase().contains("application/xml"))
        });
        if wants_xml {
            ResponseFormat::Xml
        } else {
            ResponseFormat::Json
        }
    }

    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            ResponseFormat::Json => "application/json; charset=utf-8",
            ResponseFormat::Xml => "application/xml; charset=utf-8",
        }
    }

    pub fn render(self, body: &Value) -> Result<Vec<u8>, SerializeError> {
        match self {
            ResponseFormat::Json => to_json(body),
            ResponseFormat::Xml => to_xml(body),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeError(pub String);

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "response serialization failed: {}", self.0)
    }
}

impl std::error::Error for SerializeError {}

pub fn to_json(body: &Value) -> Result<Vec<u8>, SerializeError> {
    serde_json::to_vec(body).map_err(|e| SerializeError(e.to_string()))
}

/// Render a value as XML under a `<root>` element.
///
/// Object keys become elements, list entries become repeated `<item>`
/// children and scalars become text.
pub fn to_xml(body: &Value) -> Result<Vec<u8>, SerializeError> {
    let mut writer = Writer::new(Vec::new());
    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    write_element(&mut writer, "root", body)?;
    Ok(writer.into_inner())
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), SerializeError> {
    writer
        .write_event(event)
        .map_err(|e| SerializeError(e.to_string()))
}

/// Element name for an object key; XML names cannot start with a digit or
/// contain spaces.
fn element_name(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !name.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    name
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    value: &Value,
) -> Result<(), SerializeError> {
    emit(writer, Event::Start(BytesStart::new(name)))?;
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                write_element(writer, &element_name(key), child)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                write_element(writer, "item", item)?;
            }
        }
        scalar => {
            let text = scalar_text(scalar);
            if !text.is_empty() {
                emit(writer, Event::Text(BytesText::new(&text)))?;
            }
        }
    }
    emit(writer, Event::End(BytesEnd::new(name)))
}

/// Convert a dispatcher response into an HTTP response.
///
/// A body that cannot be rendered becomes a JSON `500`.
pub fn into_http_response(response: ApiResponse, format: ResponseFormat) -> Response<Vec<u8>> {
    let (status, body, format) = match format.render(&response.body) {
        Ok(bytes) => (response.status, bytes, format),
        Err(e) => {
            error!(request_id = %response.request_id, error = %e, "Failed to serialize response");
            let fallback = ApiError::internal("SerializeError", e.to_string()).to_body();
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                fallback.to_string().into_bytes(),
                ResponseFormat::Json,
            )
        }
    };

    let mut http_response = Response::new(body);
    *http_response.status_mut() = status;
    let headers = http_response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(format.content_type()));
    if let Ok(id) = HeaderValue::from_str(&response.request_id.to_string()) {
        headers.insert(X_REQUEST_ID, id);
    }
    http_response
}
