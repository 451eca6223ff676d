#![allow(dead_code)]

use ::http::Method;
use resx::component::{Component, ComponentRegistry, ServiceCall, ServiceDescriptor, ServiceResult};
use resx::config::ServerConfig;
use resx::error::EngineFault;
use resx::params::{ParamType, ParameterDef};
use resx::server::{Engine, EngineRequest, EngineResponse};
use resx::storage::{BlobStore, MemoryStore};
use serde_json::{json, Value};
use std::sync::Arc;

pub mod test_server {
    use std::sync::Once;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        stream.set_read_timeout(Some(Duration::from_millis(200))).unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {e:?}"),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Status, content type and body of a raw HTTP/1.1 response.
    pub fn parse_parts(resp: &str) -> (u16, String, String) {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let mut status = 0;
        let mut content_type = String::new();
        for line in head.lines() {
            if line.starts_with("HTTP/1.1") {
                status = line
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or("0")
                    .parse()
                    .unwrap();
            } else if let Some((name, val)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-type") {
                    content_type = val.trim().to_string();
                }
            }
        }
        (status, content_type, body.to_string())
    }
}

/// Echoes its merged parameters and input back as JSON.
pub fn echo(call: &ServiceCall<'_>) -> Result<ServiceResult, EngineFault> {
    let params: serde_json::Map<String, Value> = call
        .params
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect();
    Ok(ServiceResult::ok(json!({
        "method": call.method.as_str(),
        "params": params,
        "input": call.input,
    })))
}

/// `Db`: a password-protected component used to exercise partial resources.
pub fn db_component() -> Component {
    Component::builder("Db")
        .desc("A database")
        .doc("Rows from a table")
        .param("account_name", ParameterDef::required(ParamType::String, "Account"))
        .param("account_password", ParameterDef::required(ParamType::Password, "Password"))
        .param("table", ParameterDef::optional(ParamType::String, "Table", "main"))
        .service(
            "entries",
            ServiceDescriptor::new("Rows")
                .param("id", ParameterDef::optional(ParamType::Number, "Row id", 0))
                .param("tag", ParameterDef::optional(ParamType::String, "Tag", ""))
                .positional(["id"])
                .params_in_body()
                .output_types(["application/json", "application/xml", "text/html", "text/csv", "*/*"]),
            echo,
        )
        .service(
            "rows",
            ServiceDescriptor::new("Rows as a table").output_types(["text/csv", "application/json"]),
            |_: &ServiceCall<'_>| {
                Ok(ServiceResult::ok(json!([
                    {"id": 1, "name": "a"},
                    {"id": 2, "name": "b"}
                ])))
            },
        )
        .service(
            "raw",
            ServiceDescriptor::new("Binary payload"),
            |_: &ServiceCall<'_>| {
                Ok(ServiceResult::ok("\u{1}\u{2}").with_header("Content-Type", "application/x-raw".to_string()))
            },
        )
        .build()
        .unwrap()
}

/// `Log`: accepts a time window, the way a log reader would.
pub fn log_component() -> Component {
    Component::builder("Log")
        .desc("Log lines")
        .service(
            "lines",
            ServiceDescriptor::new("Lines in a window")
                .param("start_time", ParameterDef::required(ParamType::String, "Start"))
                .param("end_time", ParameterDef::required(ParamType::String, "End"))
                .param("count_only", ParameterDef::optional(ParamType::Boolean, "Count", false))
                .param("filter", ParameterDef::optional(ParamType::String, "Filter", ""))
                .param("unique_only", ParameterDef::optional(ParamType::Boolean, "Unique", false)),
            echo,
        )
        .build()
        .unwrap()
}

/// `Proxy`: every service name goes to one catch-all handler.
pub fn proxy_component() -> Component {
    Component::builder("Proxy")
        .desc("Forwards anything")
        .declared_service("status", ServiceDescriptor::new("Upstream status"))
        .fallback(|call: &ServiceCall<'_>| {
            let mut result = echo(call)?;
            result.body["service"] = json!(call.service);
            Ok(result)
        })
        .build()
        .unwrap()
}

/// `Blob`: binary content in both directions.
pub fn blob_component() -> Component {
    Component::builder("Blob")
        .desc("Binary content")
        .service(
            "logo",
            ServiceDescriptor::new("A PNG header"),
            |_: &ServiceCall<'_>| Ok(ServiceResult::bytes("image/png", PNG_HEADER.to_vec())),
        )
        .service(
            "store",
            ServiceDescriptor::new("Takes any body").input_types([""]),
            |call: &ServiceCall<'_>| {
                let bytes = call.input.and_then(|i| i.as_bytes()).unwrap_or_default();
                Ok(ServiceResult::bytes("application/octet-stream", bytes.to_vec()))
            },
        )
        .build()
        .unwrap()
}

/// First bytes of a PNG file; not valid UTF-8.
pub const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0xff];

/// Built-in components plus the test components above.
pub fn registry() -> ComponentRegistry {
    let mut registry = ComponentRegistry::with_builtins().unwrap();
    registry.register(db_component()).unwrap();
    registry.register(log_component()).unwrap();
    registry.register(proxy_component()).unwrap();
    registry.register(blob_component()).unwrap();
    registry
}

pub fn engine_over(blobs: Arc<dyn BlobStore>) -> Engine {
    Engine::with_store(&ServerConfig::default(), registry(), blobs)
}

pub fn memory_engine() -> Engine {
    engine_over(Arc::new(MemoryStore::new()))
}

pub fn get(engine: &Engine, target: &str) -> EngineResponse {
    engine.handle(&EngineRequest::new(Method::GET, target).with_header("Accept", "application/json"))
}

pub fn post_json(engine: &Engine, target: &str, body: Value) -> EngineResponse {
    engine.handle(
        &EngineRequest::new(Method::POST, target)
            .with_header("Accept", "application/json")
            .with_body("application/json", body.to_string()),
    )
}

pub fn json_body(resp: &EngineResponse) -> Value {
    serde_json::from_slice(&resp.body).unwrap()
}

/// Create a resource from `component` and assert it was created.
pub fn create(engine: &Engine, target: &str, params: Value, name: &str, specialized: bool) -> Value {
    let resp = post_json(
        engine,
        target,
        json!({
            "params": params,
            "resource_creation_params": {"suggested_name": name, "specialized": specialized}
        }),
    );
    assert_eq!(resp.status, 201, "creation failed: {}", resp.text());
    json_body(&resp)
}
