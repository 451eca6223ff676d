//! # Fault taxonomy
//!
//! Every layer of the engine reports failures through [`EngineFault`]. Each
//! variant maps to exactly one HTTP status code. Faults in the allowed set are
//! shown to clients verbatim; everything else is logged with context and
//! flattened into an opaque `500 Internal Server Error`.
//!
//! Two narrower error types sit underneath:
//!
//! - [`DefinitionError`] is raised while declaring parameters and components
//!   at startup. These are programming errors and never reach a client.
//! - [`StorageError`] comes out of the key/blob store. Read-side storage faults
//!   are logged and surfaced as not-found, write-side faults become
//!   [`EngineFault::InternalServerError`].

use thiserror::Error;

/// Opaque message used whenever a fault must not leak its detail.
pub const OPAQUE_INTERNAL_MESSAGE: &str = "Internal Server Error";

/// Typed fault carried through the request pipeline.
#[derive(Debug, Error)]
pub enum EngineFault {
    /// Malformed request shape, parameter type or choice violation.
    #[error("{0}")]
    BadRequest(String),

    /// A required parameter was not supplied.
    #[error("{0}")]
    MandatoryParameterMissing(String),

    /// Unknown resource, partial resource or service.
    #[error("{0}")]
    ResourceNotFound(String),

    /// Unknown component.
    #[error("{0}")]
    ServiceNotFound(String),

    /// HTTP verb not valid for the addressed endpoint.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// A resource with the requested name already exists.
    #[error("{0}")]
    Conflict(String),

    /// Body content type not accepted, or a body sent where none is allowed.
    #[error("Unsupported media type")]
    UnsupportedMediaType,

    /// No output representation in common between client and service.
    #[error("Not acceptable")]
    NotAcceptable,

    /// Internal failure. The message is logged, never shown to clients.
    #[error("{0}")]
    InternalServerError(String),

    /// Arbitrary failure bubbling up from component code.
    #[error("component failure: {0}")]
    Component(#[from] anyhow::Error),
}

impl EngineFault {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn mandatory_missing(msg: impl Into<String>) -> Self {
        Self::MandatoryParameterMissing(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::ResourceNotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalServerError(msg.into())
    }

    /// HTTP status code for this fault.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::BadRequest(_) | Self::MandatoryParameterMissing(_) => 400,
            Self::ResourceNotFound(_) | Self::ServiceNotFound(_) => 404,
            Self::MethodNotAllowed => 405,
            Self::Conflict(_) => 409,
            Self::UnsupportedMediaType => 415,
            Self::NotAcceptable => 406,
            Self::InternalServerError(_) | Self::Component(_) => 500,
        }
    }

    /// Whether the fault's message may be passed to the client verbatim.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::InternalServerError(_) | Self::Component(_))
    }

    /// Message that is safe to show to a client.
    #[must_use]
    pub fn client_message(&self) -> String {
        if self.is_allowed() {
            self.to_string()
        } else {
            OPAQUE_INTERNAL_MESSAGE.to_string()
        }
    }
}

/// Raised while declaring parameters, services and components.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("A default value cannot be provided for a required parameter")]
    RequiredWithDefault,

    #[error("A default value is required for optional parameters")]
    OptionalWithoutDefault,

    #[error("Choices are not supported for type '{0}'")]
    ChoicesNotSupported(&'static str),

    #[error("Specified default value '{0}' is not listed in 'choices'")]
    DefaultNotInChoices(String),

    #[error("Positional parameter '{param}' of service '{service}' is not declared in its parameters")]
    UnknownPositional { service: String, param: String },

    #[error("Service '{0}' is declared without a handler")]
    MissingHandler(String),

    #[error("Component '{0}' is already registered")]
    DuplicateComponent(String),

    #[error("Component name must not be empty")]
    EmptyName,
}

/// Faults raised by a key/blob store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("key '{0}' not found")]
    NotFound(String),

    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("key '{0}' already exists")]
    AlreadyExists(String),

    #[error("malformed record '{key}': {reason}")]
    Malformed { key: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(EngineFault::bad_request("x").status(), 400);
        assert_eq!(EngineFault::mandatory_missing("x").status(), 400);
        assert_eq!(EngineFault::not_found("x").status(), 404);
        assert_eq!(EngineFault::ServiceNotFound("x".into()).status(), 404);
        assert_eq!(EngineFault::MethodNotAllowed.status(), 405);
        assert_eq!(EngineFault::NotAcceptable.status(), 406);
        assert_eq!(EngineFault::Conflict("x".into()).status(), 409);
        assert_eq!(EngineFault::UnsupportedMediaType.status(), 415);
        assert_eq!(EngineFault::internal("x").status(), 500);
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let fault = EngineFault::internal("db password rejected");
        assert!(!fault.is_allowed());
        assert_eq!(fault.client_message(), OPAQUE_INTERNAL_MESSAGE);

        let fault = EngineFault::from(anyhow::anyhow!("socket closed"));
        assert_eq!(fault.status(), 500);
        assert_eq!(fault.client_message(), OPAQUE_INTERNAL_MESSAGE);
    }

    #[test]
    fn test_allowed_message_passes_through() {
        let fault = EngineFault::bad_request("Value 'C' for parameter 'foo' is not one of the permissible choices.");
        assert_eq!(
            fault.client_message(),
            "Value 'C' for parameter 'foo' is not one of the permissible choices."
        );
    }
}
