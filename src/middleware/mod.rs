mod core;
mod metrics;
mod tracing;

pub use core::Middleware;
pub use metrics::{MetricsMiddleware, MetricsSnapshot};
pub use tracing::TracingMiddleware;
