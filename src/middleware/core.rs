use std::time::Duration;

use crate::server::{EngineRequest, EngineResponse};

/// Hook run around every request handled by the engine.
///
/// `before` may short-circuit the request by returning a response; `after`
/// sees every response, including short-circuited ones.
pub trait Middleware: Send + Sync {
    fn before(&self, _req: &EngineRequest) -> Option<EngineResponse> {
        None
    }
    fn after(&self, _req: &EngineRequest, _res: &mut EngineResponse, _latency: Duration) {}
}
