use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::params::{ParamMap, ParamValue};
use http::Method;
use may_minihttp::Request;
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, info, warn};

/// Transport-independent request handed to [`super::Engine::handle`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineRequest {
    pub request_id: RequestId,
    pub method: Method,
    /// Path without the query string
    pub path: String,
    /// Decoded query pairs in order of appearance
    pub query: Vec<(String, String)>,
    /// Header names are lowercase
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl EngineRequest {
    /// Request for `target` (path plus optional query string) with no headers
    /// and an empty body.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((p, q)) => (p, parse_query_params(q)),
            None => (target, Vec::new()),
        };
        Self {
            request_id: RequestId::new(),
            method,
            path: path.to_string(),
            query,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        if name.eq_ignore_ascii_case(REQUEST_ID_HEADER) {
            if let Some(id) = RequestId::from_header(value) {
                self.request_id = id;
            }
        }
        self
    }

    #[must_use]
    pub fn with_body(mut self, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        self.headers
            .insert("content-type".to_string(), content_type.to_string());
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Query pairs as parameter text. A name given more than once becomes a list.
    #[must_use]
    pub fn query_params(&self) -> ParamMap {
        let mut params = ParamMap::new();
        for (name, value) in &self.query {
            let value = ParamValue::Text(value.clone());
            match params.get_mut(name) {
                Some(ParamValue::List(items)) => items.push(value),
                Some(existing) => {
                    let first = std::mem::replace(existing, ParamValue::List(Vec::new()));
                    *existing = ParamValue::List(vec![first, value]);
                }
                None => {
                    params.insert(name.clone(), value);
                }
            }
        }
        params
    }
}

/// Decode a query string (without the leading `?`).
#[must_use]
pub fn parse_query_params(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Extract an [`EngineRequest`] from a `may_minihttp::Request`.
pub fn parse_request(req: Request) -> EngineRequest {
    let raw_path = req.path().to_string();
    let method = match Method::from_bytes(req.method().as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            warn!(method = %req.method(), "Unrecognised HTTP method");
            Method::GET
        }
    };

    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .map(|h| {
            (
                h.name.to_ascii_lowercase(),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect();
    debug!(
        header_count = headers.len(),
        header_names = ?headers.keys().take(20).collect::<Vec<_>>(),
        "Headers extracted"
    );

    let mut request = EngineRequest::new(method, &raw_path);
    if let Some(id) = headers.get(REQUEST_ID_HEADER).and_then(|v| RequestId::from_header(v)) {
        request.request_id = id;
    }
    request.headers = headers;

    let mut body = Vec::new();
    match req.body().read_to_end(&mut body) {
        Ok(size) if size > 0 => {
            info!(
                request_id = %request.request_id,
                content_type = %request.header("content-type").unwrap_or(""),
                body_size_bytes = size,
                "Request body read"
            );
        }
        Ok(_) => {}
        Err(e) => warn!(request_id = %request.request_id, error = %e, "Request body unreadable"),
    }
    request.body = body;

    info!(
        request_id = %request.request_id,
        method = %request.method,
        path = %request.path,
        query_count = request.query.len(),
        "HTTP request parsed"
    );
    request
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_split() {
        let req = EngineRequest::new(Method::GET, "/resource/x/entries?id=1&tag=a%20b");
        assert_eq!(req.path, "/resource/x/entries");
        assert_eq!(
            req.query,
            vec![("id".to_string(), "1".to_string()), ("tag".to_string(), "a b".to_string())]
        );
    }

    #[test]
    fn test_repeated_query_names_become_list() {
        let req = EngineRequest::new(Method::GET, "/p?a=1&b=2&a=3");
        let params = req.query_params();
        assert_eq!(
            params["a"],
            ParamValue::List(vec![ParamValue::from("1"), ParamValue::from("3")])
        );
        assert_eq!(params["b"], ParamValue::from("2"));
    }

    #[test]
    fn test_request_id_header_is_honoured() {
        let id = RequestId::new();
        let req = EngineRequest::new(Method::GET, "/").with_header("X-Request-Id", &id.to_string());
        assert_eq!(req.request_id, id);
        assert_eq!(req.header("x-request-id"), Some(id.to_string().as_str()));
    }
}
