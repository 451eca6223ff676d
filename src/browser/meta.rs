use super::{Reply, ReplyBody};
use crate::config::Prefixes;
use crate::error::EngineFault;
use crate::middleware::{MetricsMiddleware, MetricsSnapshot};
use crate::server::EngineRequest;
use crate::static_files::StaticFiles;
use http::Method;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ServerInfo<'a> {
    name: &'static str,
    version: &'static str,
    links: BTreeMap<&'static str, &'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<MetricsSnapshot>,
}

/// Server metadata served at `/` and the meta prefix.
pub fn browse(
    prefixes: &Prefixes,
    static_enabled: bool,
    metrics: Option<&MetricsMiddleware>,
    req: &EngineRequest,
    segments: &[String],
) -> Result<Reply, EngineFault> {
    if req.method != Method::GET {
        return Err(EngineFault::MethodNotAllowed);
    }
    if !segments.is_empty() {
        return Err(EngineFault::not_found(format!(
            "Cannot find '{}'",
            segments.join("/")
        )));
    }
    let mut links = BTreeMap::new();
    links.insert("code", prefixes.code.as_str());
    links.insert("resource", prefixes.resource.as_str());
    links.insert("specialized", prefixes.specialized.as_str());
    if static_enabled {
        links.insert("static", prefixes.static_files.as_str());
    }
    Reply::ok(&ServerInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        links,
        stats: metrics.map(MetricsMiddleware::snapshot),
    })
}

/// File below the static directory, sent with an extension-based type.
pub fn static_file(
    files: Option<&StaticFiles>,
    req: &EngineRequest,
    segments: &[String],
) -> Result<Reply, EngineFault> {
    if req.method != Method::GET {
        return Err(EngineFault::MethodNotAllowed);
    }
    let path = segments.join("/");
    let not_found = || EngineFault::not_found(format!("Cannot find static file '{path}'"));
    let files = files.ok_or_else(not_found)?;
    let (bytes, content_type) = files.load(&path).map_err(|e| {
        debug!(request_id = %req.request_id, path = %path, error = %e, "Static file not served");
        not_found()
    })?;
    Ok(Reply {
        status: 200,
        headers: Default::default(),
        body: ReplyBody::Bytes(bytes),
    }
    .with_header("Content-Type", content_type.to_string()))
}
