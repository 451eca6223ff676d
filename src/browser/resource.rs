use super::{Reply, ReplyBody};
use crate::component::ServiceResult;
use crate::dispatcher::{Dispatcher, Invocation, Payload};
use crate::error::EngineFault;
use crate::render::{
    default_output_types, negotiate_output, parse_accept, shortcut_media_type, split_shortcut,
    OutputFormat,
};
use crate::server::EngineRequest;
use http::Method;
use serde_json::Value;
use tracing::debug;

/// Resource catalog, resource definitions and service invocation.
///
/// - `GET /` lists resources
/// - `GET /<name>` returns the public definition
/// - `DELETE /<name>` removes the resource
/// - any method on `/<name>/<service>[.<shortcut>][/<positional>...]` runs
///   the service
pub fn browse(
    dispatcher: &Dispatcher,
    req: &EngineRequest,
    segments: &[String],
) -> Result<Reply, EngineFault> {
    match segments {
        [] if req.method == Method::GET => Reply::ok(&dispatcher.store().list(false)?),
        [name] if req.method == Method::GET => {
            let (definition, component) = dispatcher.resolve(name)?;
            Reply::ok(&definition.public_doc(&component))
        }
        [name] if req.method == Method::DELETE => {
            dispatcher.store().delete(name, false)?;
            Ok(Reply::document(200, Value::String("Resource deleted".to_string())))
        }
        [] | [_] => Err(EngineFault::MethodNotAllowed),
        [name, service, positional @ ..] => invoke_service(dispatcher, req, name, service, positional),
    }
}

fn invoke_service(
    dispatcher: &Dispatcher,
    req: &EngineRequest,
    name: &str,
    segment: &str,
    positional: &[String],
) -> Result<Reply, EngineFault> {
    let (service, shortcut) = split_shortcut(segment);
    let (definition, component) = dispatcher.resolve(name)?;

    // negotiate up front so a 406 never follows side effects
    let media_type = match shortcut {
        Some(token) => shortcut_media_type(token)
            .ok_or_else(|| {
                debug!(request_id = %req.request_id, shortcut = %token, "Unknown format shortcut");
                EngineFault::NotAcceptable
            })?
            .to_string(),
        None => {
            let preferences = parse_accept(req.header("accept"));
            let allowed = match Dispatcher::service_descriptor(&component, name, service)? {
                Some(d) => d.allowed_output_types().to_vec(),
                None => default_output_types(),
            };
            negotiate_output(&preferences, &allowed)?
        }
    };

    let payload = if req.body.is_empty() {
        Payload::None
    } else {
        Payload::Raw {
            body: &req.body,
            content_type: req.header("content-type"),
        }
    };
    let result = dispatcher.invoke(
        name,
        &definition,
        &component,
        Invocation {
            request_id: req.request_id,
            method: &req.method,
            service,
            positional,
            query: req.query_params(),
            payload,
        },
    )?;
    into_reply(result, &media_type)
}

fn into_reply(result: ServiceResult, media_type: &str) -> Result<Reply, EngineFault> {
    let ServiceResult {
        status,
        headers,
        body,
        bytes,
    } = result;
    let body = if let Some(bytes) = bytes {
        ReplyBody::Bytes(bytes)
    } else if headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("content-type")) {
        ReplyBody::Bytes(match body {
            Value::String(s) => s.into_bytes(),
            Value::Null => Vec::new(),
            other => serde_json::to_vec(&other)
                .map_err(|e| EngineFault::internal(format!("cannot serialize body: {e}")))?,
        })
    } else if status == 204 {
        ReplyBody::Empty
    } else {
        let format = OutputFormat::from_media_type(media_type).ok_or_else(|| {
            debug!(media_type = %media_type, "No renderer for negotiated type");
            EngineFault::NotAcceptable
        })?;
        ReplyBody::Negotiated(body, format)
    };
    Ok(Reply {
        status,
        headers,
        body,
    })
}
