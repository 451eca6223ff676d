use crate::error::EngineFault;
use serde::Serialize;
use serde_json::{Map, Value};

/// A parsed request body as handed to a service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Input {
    /// Structured or text content
    Data(Value),
    /// Bytes of a body accepted through the `""` input type, untouched
    Bytes(Vec<u8>),
}

impl Input {
    #[must_use]
    pub fn as_data(&self) -> Option<&Value> {
        match self {
            Self::Data(value) => Some(value),
            Self::Bytes(_) => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::Data(_) => None,
        }
    }
}

/// A request body parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    /// JSON with the payload under the `undefined` member
    ExtJson,
    Form,
    Text,
    /// Any content type, passed on as bytes
    Raw,
}

impl InputFormat {
    #[must_use]
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        match media_type {
            "application/json" => Some(Self::Json),
            "application/ext+json" => Some(Self::ExtJson),
            "application/x-www-form-urlencoded" => Some(Self::Form),
            "text/plain" => Some(Self::Text),
            _ => None,
        }
    }

    /// Parse `body`. The error text is for logs only.
    pub fn parse(self, body: &[u8]) -> Result<Input, String> {
        let value = match self {
            Self::Json => serde_json::from_slice(body).map_err(|e| e.to_string())?,
            Self::ExtJson => {
                let mut outer: Value = serde_json::from_slice(body).map_err(|e| e.to_string())?;
                outer
                    .get_mut("undefined")
                    .map(Value::take)
                    .ok_or_else(|| "missing 'undefined' member".to_string())?
            }
            Self::Form => parse_form(body),
            Self::Text => std::str::from_utf8(body)
                .map(|s| Value::String(s.to_string()))
                .map_err(|e| e.to_string())?,
            Self::Raw => return Ok(Input::Bytes(body.to_vec())),
        };
        Ok(Input::Data(value))
    }
}

/// Name/value pairs of a form body. Names seen twice collect into a list;
/// pairs without `=` are dropped.
fn parse_form(body: &[u8]) -> Value {
    let mut fields = Map::new();
    for pair in body.split(|b| *b == b'&') {
        if !pair.contains(&b'=') {
            continue;
        }
        for (name, value) in url::form_urlencoded::parse(pair) {
            let name = name.trim().to_string();
            let value = Value::String(value.trim().to_string());
            match fields.get_mut(&name) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    fields.insert(name, value);
                }
            }
        }
    }
    Value::Object(fields)
}

/// Pick a parser for a body sent with `content_type`.
///
/// The media type (parameters stripped) must be listed in `allowed`, unless
/// `allowed` contains `""`, which accepts anything as raw bytes.
pub fn select_input_format(content_type: Option<&str>, allowed: &[String]) -> Result<InputFormat, EngineFault> {
    let media_type = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();
    if allowed.iter().any(|a| *a == media_type) {
        if let Some(format) = InputFormat::from_media_type(&media_type) {
            return Ok(format);
        }
    }
    if allowed.iter().any(String::is_empty) {
        return Ok(InputFormat::Raw);
    }
    Err(EngineFault::UnsupportedMediaType)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn defaults() -> Vec<String> {
        crate::render::DEFAULT_INPUT_TYPES
            .iter()
            .map(|s| (*s).to_string())
            .collect()
    }

    #[test]
    fn test_form_repeated_names_become_list() {
        let parsed = InputFormat::Form.parse(b"a=1&b=x+y&a=2&flag&a=3").unwrap();
        assert_eq!(parsed, Input::Data(json!({"a": ["1", "2", "3"], "b": "x y"})));
    }

    #[test]
    fn test_ext_json_takes_undefined_member() {
        let parsed = InputFormat::ExtJson.parse(br#"{"undefined": {"x": 1}}"#).unwrap();
        assert_eq!(parsed.as_data(), Some(&json!({"x": 1})));
        assert!(InputFormat::ExtJson.parse(b"{}").is_err());
    }

    #[test]
    fn test_select_strips_parameters() {
        let format = select_input_format(Some("application/json; charset=UTF-8"), &defaults()).unwrap();
        assert_eq!(format, InputFormat::Json);
    }

    #[test]
    fn test_select_rejects_undeclared_type() {
        let err = select_input_format(Some("text/plain"), &defaults()).unwrap_err();
        assert_eq!(err.status(), 415);
    }

    #[test]
    fn test_empty_entry_accepts_anything() {
        let allowed = vec![String::new()];
        assert_eq!(
            select_input_format(Some("image/png"), &allowed).unwrap(),
            InputFormat::Raw
        );
    }

    #[test]
    fn test_raw_body_keeps_binary_content() {
        let body = [0x89, b'P', b'N', b'G', 0x00, 0xff];
        let parsed = InputFormat::Raw.parse(&body).unwrap();
        assert_eq!(parsed.as_bytes(), Some(&body[..]));
        assert!(InputFormat::Text.parse(&body).is_err());
    }
}
