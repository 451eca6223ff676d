use crate::component::{Component, ConnectionCache, ServiceCall, ServiceDescriptor, ServiceResult};
use crate::error::{DefinitionError, EngineFault};
use crate::params::{ParamType, ParameterDef};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

pub const NAME: &str = "SampleComponent";

/// Stand-in for a backend session opened once per `some_parameter` value.
#[derive(Debug)]
pub struct Session {
    pub id: u64,
    pub target: String,
}

#[derive(Debug, Default)]
struct SessionPool {
    cache: ConnectionCache<Arc<Session>>,
    opened: AtomicU64,
}

impl SessionPool {
    fn session(&self, target: &str) -> Result<Arc<Session>, EngineFault> {
        self.cache.get_or_try_connect(target, || {
            let id = self.opened.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(target = %target, session_id = id, "Opening sample session");
            Ok(Arc::new(Session {
                id,
                target: target.to_string(),
            }))
        })
    }
}

fn some_subresource(pool: &SessionPool, call: &ServiceCall<'_>) -> Result<ServiceResult, EngineFault> {
    let session = pool.session(call.text("some_parameter")?)?;
    Ok(ServiceResult::ok(json!({
        "message": "Some return value",
        "text": call.text("text")?,
        "num": call.param("num").map(|v| v.to_json()),
        "another_parameter": call.param("another_parameter").map(|v| v.to_json()),
        "session": session.id,
    })))
}

pub fn component() -> Result<Component, DefinitionError> {
    let pool = Arc::new(SessionPool::default());
    Component::builder(NAME)
        .desc("One line description of the component")
        .doc("Longer description text, possibly multi-line, goes here")
        .param(
            "some_parameter",
            ParameterDef::required(ParamType::String, "Short description of this parameter"),
        )
        .param(
            "another_parameter",
            ParameterDef::optional(ParamType::Number, "Short description of this parameter", 123.4),
        )
        .service(
            "some_subresource",
            ServiceDescriptor::new("This is the XYZ subresource service")
                .param("text", ParameterDef::required(ParamType::String, "This is a text parameter"))
                .param("num", ParameterDef::optional(ParamType::Number, "A numeric parameter", 10))
                .positional(["num"])
                .params_in_body()
                .output_types(["application/json", "text/html"]),
            move |call: &ServiceCall<'_>| some_subresource(&pool, call),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_reused_per_target() {
        let pool = SessionPool::default();
        let a = pool.session("alpha").unwrap();
        let again = pool.session("alpha").unwrap();
        let b = pool.session("beta").unwrap();
        assert_eq!(a.id, again.id);
        assert_ne!(a.id, b.id);
        assert_eq!(b.target, "beta");
    }

    #[test]
    fn test_contract() {
        let c = component().unwrap();
        let svc = c.service("some_subresource").unwrap();
        assert_eq!(svc.positional_params(), ["num".to_string()]);
        assert!(svc.allows_params_in_body());
        assert!(c.params()["some_parameter"].is_required());
    }
}
