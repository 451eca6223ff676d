//! # Server
//!
//! [`Engine`] is the whole request pipeline behind a transport-independent
//! `EngineRequest -> EngineResponse` call. [`AppService`] plugs it into
//! `may_minihttp`, and [`HttpServer`] binds it to a socket. Each connection
//! runs on its own `may` coroutine and a request is handled start to finish
//! on that coroutine.

mod engine;
mod http_server;
mod request;
mod response;
mod service;

pub use engine::Engine;
pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_query_params, parse_request, EngineRequest};
pub use response::{status_reason, write_response, EngineResponse};
pub use service::AppService;
