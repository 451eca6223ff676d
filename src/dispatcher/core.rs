use crate::component::{
    Component, ComponentRegistry, ResourceAccessor, ServiceCall, ServiceDescriptor, ServiceResult,
};
use crate::error::EngineFault;
use crate::ids::RequestId;
use crate::params::{
    convert_types, fill_defaults, validate_with_policy, ParamContract, ParamMap, ParamValue,
    UnknownParamPolicy,
};
use crate::render::{select_input_format, split_shortcut, Input, DEFAULT_INPUT_TYPES};
use crate::resources::{BaseExtension, CreatedResource, ResourceDefinition, ResourceStore};
use http::Method;
use once_cell::sync::Lazy;
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for service results and responses.
///
/// Header names are `Arc<str>` so repeated names (`Content-Type`,
/// `Location`) clone in O(1).
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

static DEFAULT_INPUTS: Lazy<Vec<String>> =
    Lazy::new(|| DEFAULT_INPUT_TYPES.iter().map(|s| (*s).to_string()).collect());

const SECTION: &str = "runtime parameter";

/// Request body as handed to the invoker.
#[derive(Debug, Clone)]
pub enum Payload<'a> {
    None,
    /// Bytes off the wire, parsed according to the service's input types
    Raw {
        body: &'a [u8],
        content_type: Option<&'a str>,
    },
    /// Already parsed (calls made through [`ResourceAccessor`])
    Parsed(Value),
}

/// One service call against a resolved resource.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    pub request_id: RequestId,
    pub method: &'a Method,
    pub service: &'a str,
    /// Path segments after the service segment
    pub positional: &'a [String],
    pub query: ParamMap,
    pub payload: Payload<'a>,
}

/// The service invoker.
///
/// Resolves resources through the store, merges and checks runtime
/// parameters against the service contract and runs the bound handler on the
/// calling coroutine. It is also the [`ResourceAccessor`] handed to every
/// handler, so components can call other resources and create new ones.
pub struct Dispatcher {
    registry: Arc<ComponentRegistry>,
    store: Arc<ResourceStore>,
    unknown_params: UnknownParamPolicy,
}

impl Dispatcher {
    #[must_use]
    pub fn new(registry: Arc<ComponentRegistry>, store: Arc<ResourceStore>) -> Self {
        Self {
            registry,
            store,
            unknown_params: UnknownParamPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_unknown_params(mut self, policy: UnknownParamPolicy) -> Self {
        self.unknown_params = policy;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    #[must_use]
    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    pub fn component(&self, name: &str) -> Result<Arc<Component>, EngineFault> {
        self.registry
            .get(name)
            .ok_or_else(|| EngineFault::ServiceNotFound(format!("Cannot find component '{name}'")))
    }

    /// Load a plain resource with its chain resolved, plus its component.
    pub fn resolve(&self, name: &str) -> Result<(ResourceDefinition, Arc<Component>), EngineFault> {
        let definition = self.store.load(name, false)?;
        let component_name = definition.component_name().unwrap_or_default();
        let component = self.component(component_name).map_err(|e| {
            error!(resource = %name, component = %component_name, "Resource bound to unknown component");
            e
        })?;
        Ok((definition, component))
    }

    /// Descriptor of `service`, `None` when only the catch-all handler serves it.
    pub fn service_descriptor<'c>(
        component: &'c Component,
        resource: &str,
        service: &str,
    ) -> Result<Option<&'c ServiceDescriptor>, EngineFault> {
        match component.service(service) {
            Some(d) => Ok(Some(d)),
            None if component.has_fallback() => Ok(None),
            None => Err(EngineFault::not_found(format!(
                "Service '{service}' not found in resource '{resource}'"
            ))),
        }
    }

    /// Run one service of a resolved resource.
    pub fn invoke(
        &self,
        resource: &str,
        definition: &ResourceDefinition,
        component: &Component,
        inv: Invocation<'_>,
    ) -> Result<ServiceResult, EngineFault> {
        let descriptor = Self::service_descriptor(component, resource, inv.service)?;
        let handler = component
            .handler(inv.service)
            .ok_or_else(|| EngineFault::not_found(format!("Service '{}' not found", inv.service)))?;

        let empty = ParamContract::new();
        let contract = descriptor.and_then(ServiceDescriptor::params).unwrap_or(&empty);

        let mut runtime = inv.query;
        if descriptor.is_some() {
            if let (UnknownParamPolicy::Reject, Some(name)) = (
                self.unknown_params,
                runtime.keys().find(|name| !contract.contains_key(*name)),
            ) {
                return Err(EngineFault::bad_request(format!(
                    "Unknown parameter in '{SECTION}' section: {name}"
                )));
            }
            runtime.retain(|name, _| contract.contains_key(name));
        }

        if let Some(d) = descriptor {
            for (name, value) in d.positional_params().iter().zip(inv.positional) {
                if !value.is_empty() && !runtime.contains_key(name) {
                    runtime.insert(name.clone(), ParamValue::Text(value.clone()));
                }
            }
        }

        let mut input = match inv.payload {
            Payload::None => None,
            Payload::Raw { body, .. } if body.is_empty() => None,
            Payload::Raw { body, content_type } => {
                let allowed = match descriptor {
                    Some(d) => d.allowed_input_types().ok_or(EngineFault::UnsupportedMediaType)?,
                    None => DEFAULT_INPUTS.as_slice(),
                };
                let format = select_input_format(content_type, allowed)?;
                let parsed = format.parse(body).map_err(|reason| {
                    debug!(
                        request_id = %inv.request_id,
                        resource = %resource,
                        service = %inv.service,
                        reason = %reason,
                        "Input content is malformed"
                    );
                    EngineFault::bad_request("Bad request: Input content is malformed.")
                })?;
                Some(parsed)
            }
            Payload::Parsed(value) => Some(Input::Data(value)),
        };

        if descriptor.is_some_and(ServiceDescriptor::allows_params_in_body) {
            if let Some(Input::Data(Value::Object(fields))) = &input {
                for name in contract.keys() {
                    if runtime.contains_key(name) {
                        continue;
                    }
                    if let Some(v) = fields.get(name) {
                        runtime.insert(name.clone(), ParamValue::from(v.clone()));
                    }
                }
                input = None;
            }
        }

        if descriptor.is_some() {
            validate_with_policy(&runtime, contract, SECTION, false, self.unknown_params)?;
            fill_defaults(contract, &mut runtime);
            convert_types(contract, &mut runtime)?;
        }

        let mut merged = definition.private.params.clone();
        convert_types(component.params(), &mut merged).map_err(|e| {
            EngineFault::internal(format!("stored parameters of '{resource}' do not convert: {e}"))
        })?;
        merged.extend(runtime);

        info!(
            request_id = %inv.request_id,
            resource = %resource,
            component = %component.name(),
            service = %inv.service,
            method = %inv.method,
            "Service invocation start"
        );

        let call = ServiceCall {
            method: inv.method,
            service: inv.service,
            resource_name: resource,
            input: input.as_ref(),
            params: &merged,
            accessor: self,
        };

        let start = Instant::now();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler.call(&call)));
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(result)) => {
                info!(
                    request_id = %inv.request_id,
                    resource = %resource,
                    service = %inv.service,
                    status = result.status,
                    latency_ms = elapsed_ms,
                    "Service invocation complete"
                );
                Ok(result)
            }
            Ok(Err(fault)) if fault.is_allowed() => {
                debug!(
                    request_id = %inv.request_id,
                    resource = %resource,
                    service = %inv.service,
                    status = fault.status(),
                    error = %fault,
                    "Service returned a fault"
                );
                Err(fault)
            }
            Ok(Err(fault)) => {
                error!(
                    request_id = %inv.request_id,
                    resource = %resource,
                    service = %inv.service,
                    error = %fault,
                    "Service failed"
                );
                Err(EngineFault::internal(fault.to_string()))
            }
            Err(panic) => {
                let panic_message = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                let backtrace = std::backtrace::Backtrace::capture();
                error!(
                    request_id = %inv.request_id,
                    resource = %resource,
                    service = %inv.service,
                    panic_message = %panic_message,
                    backtrace = %backtrace,
                    "Service panicked - CRITICAL"
                );
                Err(EngineFault::internal(format!("service panicked: {panic_message}")))
            }
        }
    }

    /// Create a resource from a component, or from the partial resource
    /// `base` when given.
    pub fn create_resource(
        &self,
        target: &str,
        request: &Value,
        from_partial: bool,
    ) -> Result<CreatedResource, EngineFault> {
        if from_partial {
            let base = self.store.load(target, true)?;
            let component = self.component(base.component_name().unwrap_or_default())?;
            self.store.create(
                &component,
                request,
                Some(BaseExtension {
                    name: target,
                    definition: &base,
                }),
            )
        } else {
            let component = self.component(target)?;
            self.store.create(&component, request, None)
        }
    }

    fn access(
        &self,
        uri: &str,
        params: ParamMap,
        input: Option<Value>,
        method: &Method,
    ) -> Result<ServiceResult, EngineFault> {
        let not_found = || EngineFault::not_found(format!("Cannot find resource '{uri}'"));
        let rest = uri
            .strip_prefix(self.store.prefixes().resource.as_str())
            .ok_or_else(not_found)?;
        let segments: Vec<String> = rest
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::decode(s).map(|c| c.into_owned()).unwrap_or_else(|_| s.to_string()))
            .collect();
        let [name, service, positional @ ..] = segments.as_slice() else {
            return Err(not_found());
        };
        let (service, _) = split_shortcut(service);
        let (definition, component) = self.resolve(name)?;
        self.invoke(
            name,
            &definition,
            &component,
            Invocation {
                request_id: RequestId::new(),
                method,
                service,
                positional,
                query: params,
                payload: input.map_or(Payload::None, Payload::Parsed),
            },
        )
    }
}

impl ResourceAccessor for Dispatcher {
    fn access_resource(
        &self,
        uri: &str,
        params: ParamMap,
        input: Option<Value>,
        method: Method,
    ) -> ServiceResult {
        self.access(uri, params, input, &method).unwrap_or_else(|fault| {
            warn!(uri = %uri, status = fault.status(), error = %fault, "Resource access failed");
            ServiceResult::new(fault.status(), Value::String(fault.client_message()))
        })
    }

    fn make_resource(
        &self,
        component: &str,
        request: &Value,
        specialized: bool,
    ) -> Result<CreatedResource, EngineFault> {
        self.create_resource(component, request, specialized)
    }
}
