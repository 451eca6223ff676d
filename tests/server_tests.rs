//! End-to-end tests over a real socket: `may_minihttp` parsing, the engine
//! pipeline and response writing.

mod common;

use common::http::{parse_parts, send_request};
use common::memory_engine;
use common::test_server::setup_may_runtime;
use resx::server::{AppService, HttpServer, ServerHandle};
use serde_json::{json, Value};
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

/// Server over an in-memory store, stopped on drop.
struct TestServer {
    handle: Option<ServerHandle>,
    addr: SocketAddr,
}

impl TestServer {
    fn new() -> Self {
        setup_may_runtime();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let service = AppService::new(Arc::new(memory_engine()));
        let handle = HttpServer(service).start(addr).unwrap();
        handle.wait_ready(Duration::from_secs(2)).unwrap();
        Self {
            handle: Some(handle),
            addr,
        }
    }

    fn request(&self, raw: &str) -> (u16, String, String) {
        parse_parts(&send_request(&self.addr, raw))
    }

    fn get(&self, target: &str, accept: &str) -> (u16, String, String) {
        self.request(&format!(
            "GET {target} HTTP/1.1\r\nHost: localhost\r\nAccept: {accept}\r\n\r\n"
        ))
    }

    fn post(&self, target: &str, body: &Value) -> (u16, String, String) {
        let body = body.to_string();
        self.request(&format!(
            "POST {target} HTTP/1.1\r\nHost: localhost\r\nAccept: application/json\r\n\
             Content-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        ))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

#[test]
fn test_meta_page_over_http() {
    let server = TestServer::new();
    let (status, content_type, body) = server.get("/", "application/json");
    assert_eq!(status, 200);
    assert_eq!(content_type, "application/json; charset=UTF-8");
    let info: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(info["name"], json!("resx"));
}

#[test]
fn test_create_and_call_over_http() {
    let server = TestServer::new();
    let (status, _, body) = server.post(
        "/code/Db",
        &json!({
            "params": {"account_name": "sales", "account_password": "pw"},
            "resource_creation_params": {"suggested_name": "Sales"}
        }),
    );
    assert_eq!(status, 201, "{body}");

    let (status, _, body) = server.get("/resource/Sales/entries/12?tag=a%20b", "application/json");
    assert_eq!(status, 200, "{body}");
    let echoed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(echoed["params"]["id"], json!(12));
    assert_eq!(echoed["params"]["tag"], json!("a b"));

    let (status, content_type, body) = server.get("/resource/Sales/rows", "text/csv");
    assert_eq!(status, 200);
    assert_eq!(content_type, "text/csv");
    assert_eq!(body, "id;name\n1;a\n2;b\n");
}

#[test]
fn test_errors_over_http() {
    let server = TestServer::new();
    let (status, content_type, body) = server.get("/resource/Nope", "text/plain");
    assert_eq!(status, 404);
    assert_eq!(content_type, "text/plain; charset=UTF-8");
    assert_eq!(body, "Cannot find resource 'Nope'");

    let (status, _, _) = server.request("DELETE /code/Db HTTP/1.1\r\nHost: localhost\r\n\r\n");
    assert_eq!(status, 405);
}

#[test]
fn test_request_id_header_is_returned() {
    let server = TestServer::new();
    let raw = send_request(
        &server.addr,
        "GET /code HTTP/1.1\r\nHost: localhost\r\nX-Request-Id: 01ARZ3NDEKTSV4RRFFQ69G5FAV\r\n\r\n",
    );
    assert!(raw
        .to_ascii_lowercase()
        .contains("x-request-id: 01arz3ndektsv4rrffq69g5fav"));
}
