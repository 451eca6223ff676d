use crate::dispatcher::HeaderVec;
use may_minihttp::Response;
use std::sync::Arc;

/// Transport-independent response produced by [`super::Engine::handle`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineResponse {
    pub status: u16,
    pub headers: HeaderVec,
    pub body: Vec<u8>,
}

impl EngineResponse {
    #[must_use]
    pub fn new(status: u16, content_type: &str, body: Vec<u8>) -> Self {
        let mut resp = Self {
            status,
            headers: HeaderVec::new(),
            body,
        };
        resp.set_header("Content-Type", content_type.to_string());
        resp
    }

    /// Add or replace a header (case-insensitive).
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body as UTF-8 text, lossy.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Canonical reason phrase, `"Unknown"` for unregistered codes.
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
}

/// Copy an [`EngineResponse`] onto the wire.
///
/// `may_minihttp` takes `&'static str` header lines; dynamic values are
/// leaked once per response.
pub fn write_response(res: &mut Response, resp: EngineResponse) {
    res.status_code(resp.status as usize, status_reason(resp.status));
    for (name, value) in &resp.headers {
        let line: &'static str = Box::leak(format!("{name}: {value}").into_boxed_str());
        res.header(line);
    }
    res.body_vec(resp.body);
}
