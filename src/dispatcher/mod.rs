//! # Dispatcher Module
//!
//! The service invoker. Given a resolved resource and a service name, the
//! [`Dispatcher`] builds the runtime parameter set, checks it against the
//! service contract and runs the bound handler.
//!
//! ## Parameter merge
//!
//! Runtime parameters come from three places, highest precedence first:
//!
//! 1. the query string (filtered to names the service declares)
//! 2. positional path segments after the service name, assigned left to
//!    right to the service's positional names
//! 3. the parsed request body, when the service allows parameters in the body
//!
//! The result is validated, defaults are filled in and values are converted
//! to their runtime types. The stored creation parameters of the resource are
//! then overlaid with the runtime values and handed to the handler.
//!
//! ## Execution model
//!
//! Handlers run synchronously on the request coroutine. There is no channel
//! hop and no worker pool: a handler that blocks only blocks its own request.
//! Stack size is configurable via `RESX_STACK_SIZE` (see
//! [`crate::runtime_config`]).
//!
//! ## Error Handling
//!
//! - Unknown services return `404` unless the component has a catch-all handler
//! - Handler panics are caught and logged with a backtrace
//! - Faults outside the client-visible set are logged and made opaque

mod core;

pub use core::{Dispatcher, HeaderVec, Invocation, Payload, MAX_INLINE_HEADERS};
