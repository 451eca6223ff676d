use super::Reply;
use crate::dispatcher::Dispatcher;
use crate::error::EngineFault;
use crate::resources::specialized_overwrite;
use crate::server::EngineRequest;
use http::Method;
use serde_json::Value;
use tracing::debug;

/// Component catalog (`specialized == false`) or partial resource catalog.
///
/// - `GET /` lists entries
/// - `GET /<name>` returns the component contract
/// - `GET /<name>/doc` returns the documentation text
/// - `POST /<name>` creates a resource from the component or partial
/// - `DELETE /<name>` removes a partial resource
pub fn browse(
    dispatcher: &Dispatcher,
    specialized: bool,
    req: &EngineRequest,
    segments: &[String],
) -> Result<Reply, EngineFault> {
    match (&req.method, segments) {
        (&Method::GET, []) => {
            if specialized {
                Reply::ok(&dispatcher.store().list(true)?)
            } else {
                let code_prefix = &dispatcher.store().prefixes().code;
                Reply::ok(&dispatcher.registry().catalog(code_prefix))
            }
        }
        (&Method::GET, [name]) => describe(dispatcher, specialized, name),
        (&Method::GET, [name, detail]) if detail == "doc" => {
            let doc = if specialized {
                let partial = dispatcher.store().load(name, true)?;
                dispatcher
                    .component(partial.component_name().unwrap_or_default())?
                    .doc()
                    .to_string()
            } else {
                dispatcher.component(name)?.doc().to_string()
            };
            Ok(Reply::document(200, Value::String(doc)))
        }
        (&Method::GET, [_, detail, ..]) => Err(EngineFault::not_found(format!(
            "Unknown code detail '{detail}'"
        ))),
        (&Method::POST, [name]) => {
            let request: Value = serde_json::from_slice(&req.body).map_err(|e| {
                debug!(request_id = %req.request_id, error = %e, "Creation body is not JSON");
                EngineFault::bad_request(format!("Malformed request body: {e}"))
            })?;
            let created = dispatcher.create_resource(name, &request, specialized)?;
            let location = created.uri.clone();
            let value = serde_json::to_value(&created)
                .map_err(|e| EngineFault::internal(format!("cannot serialize reply: {e}")))?;
            Ok(Reply::document(201, value).with_header("Location", location))
        }
        (&Method::DELETE, [name]) if specialized => {
            dispatcher.store().delete(name, true)?;
            Ok(Reply::document(200, Value::String("Resource deleted".to_string())))
        }
        _ => Err(EngineFault::MethodNotAllowed),
    }
}

fn describe(dispatcher: &Dispatcher, specialized: bool, name: &str) -> Result<Reply, EngineFault> {
    let code_prefix = &dispatcher.store().prefixes().code;
    if !specialized {
        return Reply::ok(&dispatcher.component(name)?.meta(code_prefix));
    }
    let partial = dispatcher.store().load(name, true)?;
    let component = dispatcher.component(partial.component_name().unwrap_or_default())?;
    let meta = specialized_overwrite(component.meta(code_prefix), &partial, &partial.private.params);
    Reply::ok(&meta)
}
