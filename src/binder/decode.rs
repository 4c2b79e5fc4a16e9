//! Custom-type checks and decoders applied after the primitive cast.

use base64::Engine as _;
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use serde_json::{Map, Value};
use std::net::IpAddr;

use crate::error::ApiError;
use crate::routes::CustomType;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("valid email regex")
});

static MAC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:[0-9A-Fa-f]{2}:){5}|(?:[0-9A-Fa-f]{2}-){5})[0-9A-Fa-f]{2}$")
        .expect("valid mac regex")
});

static DOMAIN_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").expect("valid label regex")
});

fn is_domain(s: &str) -> bool {
    let s = s.strip_suffix('.').unwrap_or(s);
    !s.is_empty() && s.len() <= 253 && s.split('.').all(|label| DOMAIN_LABEL.is_match(label))
}

fn is_url(s: &str) -> bool {
    url::Url::parse(s).is_ok_and(|u| u.has_host())
}

/// Apply a custom type to a cast value.
///
/// `email`, `url`, `ip`, `mac` and `domain` only check the value. `json`,
/// `xml` and `base64` decode string input; values that are already
/// structured (e.g. from a JSON body) pass through unchanged.
pub fn apply_custom_type(name: &str, custom: CustomType, value: Value) -> Result<Value, ApiError> {
    let invalid = |detail: &str| {
        ApiError::parameter(
            name,
            "TypeInvalid",
            format!("Parameter '{name}' must be a valid {custom}: {detail}"),
        )
    };

    let text = match value {
        Value::String(text) => text,
        structured => {
            return match custom {
                CustomType::Json | CustomType::Xml => Ok(structured),
                _ => Err(invalid("expected a string")),
            }
        }
    };

    match custom {
        CustomType::Email if EMAIL.is_match(&text) => Ok(Value::String(text)),
        CustomType::Url if is_url(&text) => Ok(Value::String(text)),
        CustomType::Ip if text.parse::<IpAddr>().is_ok() => Ok(Value::String(text)),
        CustomType::Mac if MAC.is_match(&text) => Ok(Value::String(text)),
        CustomType::Domain if is_domain(&text) => Ok(Value::String(text)),
        CustomType::Email
        | CustomType::Url
        | CustomType::Ip
        | CustomType::Mac
        | CustomType::Domain => Err(invalid("format mismatch")),
        CustomType::Json => serde_json::from_str(&text).map_err(|e| invalid(&e.to_string())),
        CustomType::Xml => parse_xml(&text).map_err(|e| invalid(&e)),
        CustomType::Base64 => {
            let bytes = decode_base64(text.trim()).map_err(|e| invalid(&e.to_string()))?;
            String::from_utf8(bytes)
                .map(Value::String)
                .map_err(|_| invalid("decoded bytes are not UTF-8"))
        }
    }
}

/// Standard alphabet first, then the unpadded and URL-safe variants.
fn decode_base64(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};

    STANDARD
        .decode(text)
        .or_else(|_| STANDARD_NO_PAD.decode(text))
        .or_else(|_| URL_SAFE.decode(text))
        .or_else(|_| URL_SAFE_NO_PAD.decode(text))
}

#[derive(Default)]
struct Element {
    attributes: Map<String, Value>,
    children: Map<String, Value>,
    text: String,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, String> {
        let mut element = Element::default();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            element
                .attributes
                .insert(key, Value::String(value.into_owned()));
        }
        Ok(element)
    }

    fn add_child(&mut self, name: String, value: Value) {
        match self.children.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.children.insert(name, value);
            }
        }
    }

    fn into_value(self) -> Value {
        if self.children.is_empty() && self.attributes.is_empty() {
            return Value::String(self.text);
        }
        let mut map = Map::new();
        if !self.attributes.is_empty() {
            map.insert("@attributes".to_string(), Value::Object(self.attributes));
        }
        if self.children.is_empty() && !self.text.is_empty() {
            map.insert("#text".to_string(), Value::String(self.text));
        }
        map.extend(self.children);
        Value::Object(map)
    }
}

/// Decode an XML document into a nested value.
///
/// The root element becomes the returned value: child elements become keys,
/// repeated names become lists, text-only elements become strings and
/// attributes are collected under `@attributes`.
pub fn parse_xml(input: &str) -> Result<Value, String> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<(String, Element)> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        let event = reader.read_event().map_err(|e| e.to_string())?;
        match event {
            Event::Start(start) => {
                if root.is_some() {
                    return Err("content after the root element".to_string());
                }
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                stack.push((name, Element::open(&start)?));
            }
            Event::Empty(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                let value = Element::open(&start)?.into_value();
                match stack.last_mut() {
                    Some((_, parent)) => parent.add_child(name, value),
                    None if root.is_none() => root = Some(value),
                    None => return Err("content after the root element".to_string()),
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| e.to_string())?;
                match stack.last_mut() {
                    Some((_, element)) => element.text.push_str(&text),
                    None => return Err("text outside the root element".to_string()),
                }
            }
            Event::CData(data) => {
                if let Some((_, element)) = stack.last_mut() {
                    element
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let Some((name, element)) = stack.pop() else {
                    return Err("unbalanced closing tag".to_string());
                };
                let value = element.into_value();
                match stack.last_mut() {
                    Some((_, parent)) => parent.add_child(name, value),
                    None => root = Some(value),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err("unexpected end of document".to_string());
    }
    root.ok_or_else(|| "document has no root element".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apply(custom: CustomType, raw: &str) -> Result<Value, ApiError> {
        apply_custom_type("field", custom, json!(raw))
    }

    #[test]
    fn test_check_only_types_keep_value() {
        assert_eq!(apply(CustomType::Email, "ann@example.com").unwrap(), json!("ann@example.com"));
        assert_eq!(apply(CustomType::Url, "https://example.com/a?b=1").unwrap(), json!("https://example.com/a?b=1"));
        assert!(apply(CustomType::Ip, "10.0.0.1").is_ok());
        assert!(apply(CustomType::Ip, "::1").is_ok());
        assert!(apply(CustomType::Mac, "00:1A:2b:3c:4D:5e").is_ok());
        assert!(apply(CustomType::Mac, "00-1A-2b-3c-4D-5e").is_ok());
        assert!(apply(CustomType::Domain, "api.example.com").is_ok());
    }

    #[test]
    fn test_check_only_types_reject() {
        for (custom, raw) in [
            (CustomType::Email, "ann@"),
            (CustomType::Url, "not a url"),
            (CustomType::Ip, "300.1.1.1"),
            (CustomType::Mac, "00:1A-2b:3c:4D:5e"),
            (CustomType::Domain, "-bad-.com"),
        ] {
            let err = apply(custom, raw).unwrap_err();
            assert_eq!(err.code(), "fieldTypeInvalid", "{custom} accepted {raw}");
        }
    }

    #[test]
    fn test_json_decode() {
        assert_eq!(
            apply(CustomType::Json, r#"{"a": [1, 2]}"#).unwrap(),
            json!({"a": [1, 2]})
        );
        assert_eq!(apply(CustomType::Json, "{").unwrap_err().code(), "fieldTypeInvalid");
        let structured = apply_custom_type("field", CustomType::Json, json!({"a": 1})).unwrap();
        assert_eq!(structured, json!({"a": 1}));
    }

    #[test]
    fn test_base64_decode() {
        assert_eq!(apply(CustomType::Base64, "aGVsbG8=").unwrap(), json!("hello"));
        assert_eq!(apply(CustomType::Base64, "aGVsbG8").unwrap(), json!("hello"));
        // "??>" encodes to "Pz8+" in the standard alphabet
        assert_eq!(apply(CustomType::Base64, "Pz8-").unwrap(), json!("??>"));
        assert_eq!(apply(CustomType::Base64, "Pz8+").unwrap(), json!("??>"));
        assert!(apply(CustomType::Base64, "***").is_err());
    }

    #[test]
    fn test_xml_decode() {
        let value = parse_xml(
            r#"<?xml version="1.0"?>
            <user id="7">
                <name>Ann &amp; Lee</name>
                <tag>a</tag>
                <tag>b</tag>
                <empty/>
            </user>"#,
        )
        .unwrap();
        assert_eq!(
            value,
            json!({
                "@attributes": {"id": "7"},
                "name": "Ann & Lee",
                "tag": ["a", "b"],
                "empty": ""
            })
        );
    }

    #[test]
    fn test_xml_rejects_malformed() {
        assert!(parse_xml("<a><b></a>").is_err());
        assert!(parse_xml("<a>").is_err());
        assert!(parse_xml("").is_err());
        assert_eq!(apply(CustomType::Xml, "<a>").unwrap_err().code(), "fieldTypeInvalid");
    }
}
