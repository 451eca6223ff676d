//! # Browsers
//!
//! One handler per top-level category. Each takes the decoded path segments
//! after the category prefix and returns a [`Reply`] or an
//! [`EngineFault`](crate::error::EngineFault). Turning a reply into bytes
//! (content negotiation, rendering, headers) is left to the engine.
//!
//! | Category      | Handler                  |
//! |---------------|--------------------------|
//! | meta          | [`meta::browse`]         |
//! | code          | [`code::browse`]         |
//! | specialized   | [`code::browse`]         |
//! | resource      | [`resource::browse`]     |
//! | static        | [`meta::static_file`]    |

pub mod code;
pub mod meta;
pub mod resource;

use crate::dispatcher::HeaderVec;
use crate::error::EngineFault;
use crate::render::OutputFormat;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// What a browser hands back to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub headers: HeaderVec,
    pub body: ReplyBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    /// Data negotiated against the default output types
    Document(Value),
    /// Data with its representation already chosen
    Negotiated(Value, OutputFormat),
    /// Finished bytes; the `Content-Type` header is already set
    Bytes(Vec<u8>),
    Empty,
}

impl Reply {
    #[must_use]
    pub fn document(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            body: ReplyBody::Document(body),
        }
    }

    /// `200` document from anything serializable.
    pub fn ok<T: Serialize>(body: &T) -> Result<Self, EngineFault> {
        let value = serde_json::to_value(body)
            .map_err(|e| EngineFault::internal(format!("cannot serialize reply: {e}")))?;
        Ok(Self::document(200, value))
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: String) -> Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
        self
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
