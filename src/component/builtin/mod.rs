//! Components shipped with the server.
//!
//! They double as worked examples of the registration API:
//!
//! - [`sample`]: the minimal template, a required and an optional creation
//!   parameter plus one service with a positional parameter
//! - [`test_component`]: choice-constrained parameters, a service that takes
//!   no body, and a service that creates other resources
//! - [`time_range`]: forwards computed time windows to another resource

pub mod sample;
pub mod test_component;
pub mod time_range;

use super::Component;
use crate::error::DefinitionError;

/// Every built-in component, ready to register.
pub fn all() -> Result<Vec<Component>, DefinitionError> {
    Ok(vec![
        sample::component()?,
        test_component::component()?,
        time_range::component()?,
    ])
}
