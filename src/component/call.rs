use crate::dispatcher::HeaderVec;
use crate::error::EngineFault;
use crate::params::{ParamMap, ParamValue};
use crate::render::Input;
use crate::resources::CreatedResource;
use chrono::{NaiveDate, NaiveTime};
use http::Method;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Capabilities a service method may use to reach the rest of the system.
pub trait ResourceAccessor: Send + Sync {
    /// Call a service of another resource.
    ///
    /// `uri` is `<resource prefix>/<name>/<service>[/<positional>...]`. Faults
    /// come back as a result carrying the fault's status and client message
    /// so the caller can decide how to react.
    fn access_resource(
        &self,
        uri: &str,
        params: ParamMap,
        input: Option<Value>,
        method: Method,
    ) -> ServiceResult;

    /// Create a new resource from a component, or from a partial resource
    /// when `specialized` is set.
    fn make_resource(
        &self,
        component: &str,
        request: &Value,
        specialized: bool,
    ) -> Result<CreatedResource, EngineFault>;
}

/// Everything a service method receives for one invocation.
pub struct ServiceCall<'a> {
    pub method: &'a Method,
    pub service: &'a str,
    pub resource_name: &'a str,
    /// Parsed request body, absent when consumed as parameters
    pub input: Option<&'a Input>,
    /// Stored creation parameters overlaid with validated runtime parameters
    pub params: &'a ParamMap,
    pub accessor: &'a dyn ResourceAccessor,
}

impl<'a> ServiceCall<'a> {
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&'a ParamValue> {
        self.params.get(name)
    }

    fn typed<T>(&self, name: &str, kind: &str, get: impl Fn(&'a ParamValue) -> Option<T>) -> Result<T, EngineFault> {
        let value = self
            .param(name)
            .ok_or_else(|| EngineFault::internal(format!("parameter '{name}' is not set")))?;
        get(value).ok_or_else(|| {
            EngineFault::internal(format!(
                "parameter '{name}' holds {} where {kind} was expected",
                value.kind()
            ))
        })
    }

    pub fn text(&self, name: &str) -> Result<&'a str, EngineFault> {
        self.typed(name, "text", ParamValue::as_str)
    }

    pub fn number(&self, name: &str) -> Result<f64, EngineFault> {
        self.typed(name, "a number", ParamValue::as_f64)
    }

    pub fn integer(&self, name: &str) -> Result<i64, EngineFault> {
        self.typed(name, "an integer", ParamValue::as_i64)
    }

    pub fn boolean(&self, name: &str) -> Result<bool, EngineFault> {
        self.typed(name, "a boolean", ParamValue::as_bool)
    }

    pub fn date(&self, name: &str) -> Result<NaiveDate, EngineFault> {
        self.typed(name, "a date", ParamValue::as_date)
    }

    pub fn time(&self, name: &str) -> Result<NaiveTime, EngineFault> {
        self.typed(name, "a time", ParamValue::as_time)
    }

    pub fn list(&self, name: &str) -> Result<&'a [ParamValue], EngineFault> {
        self.typed(name, "a list", ParamValue::as_list)
    }
}

/// A callable service body.
///
/// Implemented for every `Fn(&ServiceCall) -> Result<ServiceResult, EngineFault>`.
pub trait ServiceHandler: Send + Sync {
    fn call(&self, call: &ServiceCall<'_>) -> Result<ServiceResult, EngineFault>;
}

impl<F> ServiceHandler for F
where
    F: Fn(&ServiceCall<'_>) -> Result<ServiceResult, EngineFault> + Send + Sync,
{
    fn call(&self, call: &ServiceCall<'_>) -> Result<ServiceResult, EngineFault> {
        self(call)
    }
}

/// Outcome of a service method: status, optional headers and a body.
///
/// When the handler sets `Content-Type` itself, content negotiation and
/// rendering are skipped and the body is sent as is. `bytes`, when set,
/// replaces `body` on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceResult {
    pub status: u16,
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    pub body: Value,
    #[serde(skip_serializing)]
    pub bytes: Option<Vec<u8>>,
}

impl ServiceResult {
    #[must_use]
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            body,
            bytes: None,
        }
    }

    /// `200` with a binary payload of the given type, sent without rendering.
    #[must_use]
    pub fn bytes(content_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            bytes: Some(bytes),
            ..Self::new(200, Value::Null)
        }
        .with_header("Content-Type", content_type.to_string())
    }

    #[must_use]
    pub fn ok(body: impl Into<Value>) -> Self {
        Self::new(200, body.into())
    }

    /// `201 Created` with a `Location` header.
    #[must_use]
    pub fn created(location: &str, body: impl Into<Value>) -> Self {
        Self::new(201, body.into()).with_header("Location", location.to_string())
    }

    #[must_use]
    pub fn no_content() -> Self {
        Self::new(204, Value::Null)
    }

    #[must_use]
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(400, Value::String(msg.into()))
    }

    #[must_use]
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(404, Value::String(msg.into()))
    }

    /// Distinguished status for outbound calls that ran out of time.
    #[must_use]
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(408, Value::String(msg.into()))
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: String) -> Self {
        self.set_header(name, value);
        self
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
}
