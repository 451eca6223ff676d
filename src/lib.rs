//! # resx
//!
//! **resx** turns registered *components* into persisted, parameterized HTTP
//! *resources*. A client creates a resource by posting concrete parameter
//! values to a component; the resource is stored and from then on its
//! services are callable under its own URI, with request parameters checked
//! against each service's contract and responses rendered in the
//! representation the client negotiates.
//!
//! ## Overview
//!
//! The server runs on the `may` coroutine runtime through `may_minihttp`.
//! Each request is handled end to end on its own coroutine: routing,
//! parameter checking, the component's service body and rendering.
//!
//! ## Architecture
//!
//! - **[`params`]** - Parameter types, definitions and contract checking
//! - **[`component`]** - Component declarations, service handlers and the registry
//! - **[`storage`]** - Key/blob persistence (directory or memory backed)
//! - **[`resources`]** - Resource records, partial resources and chain resolution
//! - **[`dispatcher`]** - The service invoker
//! - **[`render`]** - Content negotiation, output renderers and input parsers
//! - **[`router`]** - Category prefix matching
//! - **[`browser`]** - Handlers for the code, specialized, resource, meta and static areas
//! - **[`server`]** - The request pipeline and the `may_minihttp` integration
//! - **[`middleware`]** - Request metrics and tracing
//! - **[`config`]**, **[`logging`]**, **[`runtime_config`]** - Startup configuration
//! - **[`cli`]** - The `resx` command line
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as server::AppService
//!     participant Engine as server::Engine
//!     participant Router as router::PrefixRouter
//!     participant Browser as browser::resource
//!     participant Invoker as dispatcher::Dispatcher
//!     participant Store as resources::ResourceStore
//!     participant Handler as Service handler
//!
//!     Client->>Server: GET /resource/Sales/entries/42
//!     Server->>Engine: handle(EngineRequest)
//!     Engine->>Router: match_path
//!     Router-->>Engine: Resource, ["Sales","entries","42"]
//!     Engine->>Browser: browse
//!     Browser->>Invoker: resolve("Sales")
//!     Invoker->>Store: load (extension chain)
//!     Browser->>Browser: negotiate output type
//!     Browser->>Invoker: invoke
//!     Invoker->>Invoker: merge, validate, convert
//!     Invoker->>Handler: call(ServiceCall)
//!     Handler-->>Invoker: ServiceResult
//!     Engine->>Engine: render
//!     Engine-->>Client: 200 + body
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use resx::component::ComponentRegistry;
//! use resx::config::ServerConfig;
//! use resx::server::{Engine, EngineRequest};
//! use resx::storage::MemoryStore;
//! use http::Method;
//! use std::sync::Arc;
//!
//! let registry = ComponentRegistry::with_builtins().unwrap();
//! let engine = Engine::with_store(&ServerConfig::default(), registry, Arc::new(MemoryStore::new()));
//!
//! let create = EngineRequest::new(Method::POST, "/code/SampleComponent").with_body(
//!     "application/json",
//!     r#"{"params": {"some_parameter": "hi"},
//!         "resource_creation_params": {"suggested_name": "Demo"}}"#,
//! );
//! assert_eq!(engine.handle(&create).status, 201);
//!
//! let call = EngineRequest::new(Method::GET, "/resource/Demo/some_subresource?text=x")
//!     .with_header("Accept", "application/json");
//! assert_eq!(engine.handle(&call).status, 200);
//! ```

pub mod browser;
pub mod cli;
pub mod component;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod params;
pub mod render;
pub mod resources;
pub mod router;
pub mod runtime_config;
pub mod server;
pub mod static_files;
pub mod storage;

pub use error::EngineFault;
