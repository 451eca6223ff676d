//! # Content Negotiation & Renderers
//!
//! Picks the representation of a response from what the client asks for and
//! what the service declares it can produce, and picks a parser for request
//! bodies from `Content-Type` and the service's declared input types.
//!
//! ## Output
//!
//! | Media type             | Output                                        |
//! |------------------------|-----------------------------------------------|
//! | `application/json`     | JSON                                          |
//! | `application/ext+json` | JSON                                          |
//! | `application/xml`      | `<rxdoc>` document, keys sorted               |
//! | `text/html`, `*/*`, `""` | HTML page with nested tables                |
//! | `text/plain`           | text as is, anything else as compact JSON     |
//! | `text/csv`             | `;`-separated rows from a list of maps/lists  |
//!
//! A `.csv`, `.xml`, `.json` or `.ext_json` suffix on a service segment
//! overrides the `Accept` header.
//!
//! ## Input
//!
//! `application/json`, `application/ext+json` (the `undefined` member),
//! `application/x-www-form-urlencoded` (repeated names become lists) and
//! `text/plain`. A service that lists `""` among its input types accepts any
//! body and receives its bytes untouched.

mod input;
mod negotiation;
mod output;

pub use input::{select_input_format, Input, InputFormat};
pub use negotiation::{negotiate_output, parse_accept, shortcut_media_type, split_shortcut};
pub use output::OutputFormat;

/// Output types of services that do not declare their own.
pub const DEFAULT_OUTPUT_TYPES: &[&str] = &["application/json", "application/xml", "text/html", "*/*"];

/// Input types of services that do not declare their own.
pub const DEFAULT_INPUT_TYPES: &[&str] = &["application/json", "application/x-www-form-urlencoded"];

/// [`DEFAULT_OUTPUT_TYPES`] as owned strings.
#[must_use]
pub fn default_output_types() -> Vec<String> {
    DEFAULT_OUTPUT_TYPES.iter().map(|s| (*s).to_string()).collect()
}
