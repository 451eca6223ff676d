use std::time::Duration;
use tracing::{debug, info, info_span, warn};

use super::Middleware;
use crate::server::{EngineRequest, EngineResponse};

/// Logs one line per request on completion, inside a `request` span.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, req: &EngineRequest) -> Option<EngineResponse> {
        debug!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            "Request received"
        );
        None
    }

    fn after(&self, req: &EngineRequest, res: &mut EngineResponse, latency: Duration) {
        let span = info_span!(
            "request",
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
        );
        let _enter = span.enter();
        let latency_ms = latency.as_millis() as u64;
        if res.status >= 500 {
            warn!(status = res.status, latency_ms, "Request failed");
        } else {
            info!(
                status = res.status,
                latency_ms,
                body_size_bytes = res.body.len(),
                "Request completed"
            );
        }
    }
}
