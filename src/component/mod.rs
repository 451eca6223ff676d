//! # Component Registry
//!
//! A component is a named capability: a creation-time parameter contract plus
//! a table of callable services. Components are registered explicitly at
//! startup through [`ComponentBuilder`]; each `(component, service)` pair is
//! bound to a [`ServiceHandler`] at registration time, so dispatch never looks
//! methods up by name at runtime.
//!
//! The [`ComponentRegistry`] is built once, wrapped in an `Arc` and handed to
//! the engine. It is read-only afterwards and safe to share across
//! coroutines.
//!
//! ```rust
//! use resx::component::{Component, ServiceDescriptor, ServiceCall, ServiceResult};
//! use resx::error::EngineFault;
//! use resx::params::{ParamType, ParameterDef};
//!
//! fn greet(call: &ServiceCall<'_>) -> Result<ServiceResult, EngineFault> {
//!     Ok(ServiceResult::ok(format!("Hello {}", call.text("who")?)))
//! }
//!
//! let component = Component::builder("Greeter")
//!     .desc("Says hello")
//!     .param("who", ParameterDef::required(ParamType::String, "Who to greet"))
//!     .service("greet", ServiceDescriptor::new("Greets"), greet)
//!     .build()
//!     .unwrap();
//! assert_eq!(component.name(), "Greeter");
//! ```

pub mod builtin;
mod cache;
mod call;
mod registry;
mod service;

pub use cache::ConnectionCache;
pub use call::{ResourceAccessor, ServiceCall, ServiceHandler, ServiceResult};
pub use registry::{CatalogEntry, ComponentRegistry};
pub use service::{ServiceDescriptor, ServiceDoc};

use crate::error::{DefinitionError, EngineFault};
use crate::params::{contract_doc, ParamContract, ParameterDef, ParameterDoc};
use crate::resources::creation_contract;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

struct ServiceEntry {
    descriptor: ServiceDescriptor,
    handler: Option<Arc<dyn ServiceHandler>>,
}

/// A registered component: metadata, parameter contract and bound services.
pub struct Component {
    name: String,
    desc: String,
    doc: String,
    params: ParamContract,
    services: BTreeMap<String, ServiceEntry>,
    fallback: Option<Arc<dyn ServiceHandler>>,
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("services", &self.services.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl Component {
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ComponentBuilder {
        ComponentBuilder {
            name: name.into(),
            desc: String::new(),
            doc: String::new(),
            params: ParamContract::new(),
            services: BTreeMap::new(),
            fallback: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn desc(&self) -> &str {
        &self.desc
    }

    #[must_use]
    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Creation-time parameter contract.
    #[must_use]
    pub fn params(&self) -> &ParamContract {
        &self.params
    }

    #[must_use]
    pub fn service(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.services.get(name).map(|e| &e.descriptor)
    }

    pub fn services(&self) -> impl Iterator<Item = (&str, &ServiceDescriptor)> {
        self.services
            .iter()
            .map(|(name, e)| (name.as_str(), &e.descriptor))
    }

    /// Handler bound to `service`, falling back to the catch-all dispatcher.
    #[must_use]
    pub fn handler(&self, service: &str) -> Option<Arc<dyn ServiceHandler>> {
        self.services
            .get(service)
            .and_then(|e| e.handler.clone())
            .or_else(|| self.fallback.clone())
    }

    #[must_use]
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// `<code prefix>/<name>`
    #[must_use]
    pub fn code_uri(&self, code_prefix: &str) -> String {
        format!("{code_prefix}/{}", self.name)
    }

    /// Service table with every service addressed below `home_uri`.
    #[must_use]
    pub fn services_doc(&self, home_uri: &str) -> BTreeMap<String, ServiceDoc> {
        self.services
            .iter()
            .map(|(name, e)| (name.clone(), e.descriptor.doc(format!("{home_uri}/{name}"))))
            .collect()
    }

    /// Full published contract of this component.
    #[must_use]
    pub fn meta(&self, code_prefix: &str) -> ComponentMeta {
        let uri = self.code_uri(code_prefix);
        ComponentMeta {
            doc: format!("{uri}/doc"),
            name: self.name.clone(),
            desc: self.desc.clone(),
            params: contract_doc(&self.params),
            resource_creation_params: contract_doc(&creation_contract(&self.name, None)),
            services: self.services_doc(&uri),
            uri,
        }
    }
}

/// Published contract of a component (or of a partial resource built on one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentMeta {
    pub uri: String,
    pub name: String,
    pub desc: String,
    pub doc: String,
    pub params: BTreeMap<String, ParameterDoc>,
    pub resource_creation_params: BTreeMap<String, ParameterDoc>,
    pub services: BTreeMap<String, ServiceDoc>,
}

/// Step-by-step construction of a [`Component`].
pub struct ComponentBuilder {
    name: String,
    desc: String,
    doc: String,
    params: ParamContract,
    services: BTreeMap<String, ServiceEntry>,
    fallback: Option<Arc<dyn ServiceHandler>>,
}

impl ComponentBuilder {
    #[must_use]
    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, def: ParameterDef) -> Self {
        self.params.insert(name.into(), def);
        self
    }

    #[must_use]
    pub fn service<H>(self, name: impl Into<String>, descriptor: ServiceDescriptor, handler: H) -> Self
    where
        H: Fn(&call::ServiceCall<'_>) -> Result<ServiceResult, EngineFault> + Send + Sync + 'static,
    {
        self.service_handler(name, descriptor, Arc::new(handler))
    }

    #[must_use]
    pub fn service_handler(
        mut self,
        name: impl Into<String>,
        descriptor: ServiceDescriptor,
        handler: Arc<dyn ServiceHandler>,
    ) -> Self {
        self.services.insert(
            name.into(),
            ServiceEntry {
                descriptor,
                handler: Some(handler),
            },
        );
        self
    }

    /// Declare a service whose calls are routed to the catch-all handler.
    #[must_use]
    pub fn declared_service(mut self, name: impl Into<String>, descriptor: ServiceDescriptor) -> Self {
        self.services.insert(
            name.into(),
            ServiceEntry {
                descriptor,
                handler: None,
            },
        );
        self
    }

    /// Catch-all handler for services without a bound handler.
    #[must_use]
    pub fn fallback<H>(mut self, handler: H) -> Self
    where
        H: Fn(&call::ServiceCall<'_>) -> Result<ServiceResult, EngineFault> + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> Result<Component, DefinitionError> {
        if self.name.is_empty() {
            return Err(DefinitionError::EmptyName);
        }
        for (service, entry) in &self.services {
            if entry.handler.is_none() && self.fallback.is_none() {
                return Err(DefinitionError::MissingHandler(service.clone()));
            }
            let declared = entry.descriptor.params();
            for p in entry.descriptor.positional_params() {
                if !declared.is_some_and(|c| c.contains_key(p)) {
                    return Err(DefinitionError::UnknownPositional {
                        service: service.clone(),
                        param: p.clone(),
                    });
                }
            }
        }
        Ok(Component {
            name: self.name,
            desc: self.desc,
            doc: self.doc,
            params: self.params,
            services: self.services,
            fallback: self.fallback,
        })
    }
}
