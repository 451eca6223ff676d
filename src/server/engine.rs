use super::{EngineRequest, EngineResponse};
use crate::browser::{code, meta, resource, Reply, ReplyBody};
use crate::component::ComponentRegistry;
use crate::config::{Prefixes, ServerConfig};
use crate::dispatcher::Dispatcher;
use crate::error::{EngineFault, StorageError};
use crate::middleware::{MetricsMiddleware, Middleware, TracingMiddleware};
use crate::render::{default_output_types, negotiate_output, parse_accept, OutputFormat};
use crate::resources::ResourceStore;
use crate::router::{PrefixRouter, RouteCategory};
use crate::static_files::StaticFiles;
use crate::storage::{BlobStore, FileStore};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

static DOCUMENT_TYPES: Lazy<Vec<String>> = Lazy::new(default_output_types);

/// Request pipeline: middleware, category routing, browsing and rendering.
///
/// `handle` never fails; every fault ends up as a rendered error response.
pub struct Engine {
    dispatcher: Arc<Dispatcher>,
    router: PrefixRouter,
    prefixes: Prefixes,
    static_files: Option<StaticFiles>,
    middlewares: Vec<Arc<dyn Middleware>>,
    metrics: Option<Arc<MetricsMiddleware>>,
}

impl Engine {
    /// Engine without middleware or static files. Prefixes come from the
    /// dispatcher's resource store.
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        let prefixes = dispatcher.store().prefixes().clone();
        Self {
            router: PrefixRouter::new(&prefixes),
            dispatcher,
            prefixes,
            static_files: None,
            middlewares: Vec::new(),
            metrics: None,
        }
    }

    /// Engine over `blobs` configured from `config`, with metrics and
    /// request logging installed.
    #[must_use]
    pub fn with_store(config: &ServerConfig, registry: ComponentRegistry, blobs: Arc<dyn BlobStore>) -> Self {
        let store = ResourceStore::new(blobs)
            .with_prefixes(config.prefixes.clone())
            .with_collision(config.name_collision)
            .with_max_extension_depth(config.max_extension_depth)
            .with_unknown_params(config.unknown_params);
        let dispatcher = Dispatcher::new(Arc::new(registry), Arc::new(store))
            .with_unknown_params(config.unknown_params);
        let mut engine = Self::new(Arc::new(dispatcher))
            .with_metrics(Arc::new(MetricsMiddleware::new()))
            .with_middleware(Arc::new(TracingMiddleware));
        if let Some(dir) = &config.static_dir {
            engine = engine.with_static_files(StaticFiles::new(dir.clone()));
        }
        engine
    }

    /// Engine over a [`FileStore`] at `config.storage_dir`.
    pub fn from_config(config: &ServerConfig, registry: ComponentRegistry) -> Result<Self, StorageError> {
        let blobs = FileStore::open(config.storage_dir.clone())?;
        info!(
            storage_dir = %config.storage_dir.display(),
            components = registry.len(),
            "Resource store opened"
        );
        Ok(Self::with_store(config, registry, Arc::new(blobs)))
    }

    #[must_use]
    pub fn with_static_files(mut self, files: StaticFiles) -> Self {
        self.static_files = Some(files);
        self
    }

    #[must_use]
    pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Install the metrics middleware and expose its counters on the meta page.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<MetricsMiddleware>) -> Self {
        self.middlewares.push(Arc::clone(&metrics) as Arc<dyn Middleware>);
        self.metrics = Some(metrics);
        self
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub fn metrics(&self) -> Option<&MetricsMiddleware> {
        self.metrics.as_deref()
    }

    #[must_use]
    pub fn prefixes(&self) -> &Prefixes {
        &self.prefixes
    }

    #[must_use]
    pub fn handle(&self, req: &EngineRequest) -> EngineResponse {
        let start = Instant::now();

        let early = self.middlewares.iter().find_map(|mw| mw.before(req));
        let mut resp = match early {
            Some(resp) => resp,
            None => match self.route(req).and_then(|reply| self.render(req, reply)) {
                Ok(resp) => resp,
                Err(fault) => self.fault_response(req, &fault),
            },
        };
        resp.set_header("X-Request-Id", req.request_id.to_string());

        let latency = start.elapsed();
        for mw in &self.middlewares {
            mw.after(req, &mut resp, latency);
        }
        resp
    }

    fn route(&self, req: &EngineRequest) -> Result<Reply, EngineFault> {
        let Some(route) = self.router.match_path(&req.path) else {
            return Err(EngineFault::not_found(format!("Cannot find '{}'", req.path)));
        };
        debug!(
            request_id = %req.request_id,
            category = route.category.as_str(),
            segments = route.segments.len(),
            "Route matched"
        );
        let segments = route.segments.as_slice();
        match route.category {
            RouteCategory::Meta => meta::browse(
                &self.prefixes,
                self.static_files.is_some(),
                self.metrics(),
                req,
                segments,
            ),
            RouteCategory::Code => code::browse(&self.dispatcher, false, req, segments),
            RouteCategory::Specialized => code::browse(&self.dispatcher, true, req, segments),
            RouteCategory::Resource => resource::browse(&self.dispatcher, req, segments),
            RouteCategory::Static => meta::static_file(self.static_files.as_ref(), req, segments),
        }
    }

    fn render(&self, req: &EngineRequest, reply: Reply) -> Result<EngineResponse, EngineFault> {
        let Reply {
            status,
            headers,
            body,
        } = reply;
        let (content_type, bytes) = match body {
            ReplyBody::Document(value) => {
                let format = document_format(req)?;
                (Some(format.content_type()), format.render(&value, &req.path)?)
            }
            ReplyBody::Negotiated(value, format) => {
                (Some(format.content_type()), format.render(&value, &req.path)?)
            }
            ReplyBody::Bytes(bytes) => (None, bytes),
            ReplyBody::Empty => (Some(OutputFormat::Text.content_type()), Vec::new()),
        };
        let mut resp = EngineResponse {
            status,
            headers,
            body: bytes,
        };
        if let Some(ct) = content_type {
            resp.set_header("Content-Type", ct.to_string());
        } else if resp.get_header("Content-Type").is_none() {
            resp.set_header("Content-Type", "application/octet-stream".to_string());
        }
        Ok(resp)
    }

    fn fault_response(&self, req: &EngineRequest, fault: &EngineFault) -> EngineResponse {
        if fault.is_allowed() {
            debug!(
                request_id = %req.request_id,
                status = fault.status(),
                error = %fault,
                "Request refused"
            );
        } else {
            error!(
                request_id = %req.request_id,
                method = %req.method,
                path = %req.path,
                error = %fault,
                "Request failed"
            );
        }
        let message = Value::String(fault.client_message());
        // the error must not fail again on an Accept the client cannot satisfy
        let format = document_format(req).unwrap_or(OutputFormat::Text);
        let body = format
            .render(&message, &req.path)
            .or_else(|_| OutputFormat::Text.render(&message, &req.path))
            .unwrap_or_default();
        EngineResponse::new(fault.status(), format.content_type(), body)
    }
}

/// Format of engine-produced documents for this client.
fn document_format(req: &EngineRequest) -> Result<OutputFormat, EngineFault> {
    let preferences = parse_accept(req.header("accept"));
    let media_type = negotiate_output(&preferences, &DOCUMENT_TYPES)?;
    OutputFormat::from_media_type(&media_type).ok_or(EngineFault::NotAcceptable)
}
