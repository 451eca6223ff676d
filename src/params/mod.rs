//! # Parameter Type System
//!
//! Components declare their creation-time and per-call parameters as a
//! [`ParamContract`], a map of names to [`ParameterDef`]s. Incoming values
//! arrive as text (query strings, path segments, form bodies) or as JSON, and
//! are checked and coerced here before any component code sees them.
//!
//! ## Conversion table
//!
//! | Type           | Accepted as-is | Converted from                         |
//! |----------------|----------------|----------------------------------------|
//! | `string`       | text           | -                                      |
//! | `password`     | text           | -                                      |
//! | `uri`          | text           | -                                      |
//! | `boolean`      | boolean        | text in `{y, yes, true, t, 1}` is true |
//! | `number`       | number         | integer literal, then float literal    |
//! | `date`         | date           | `YYYY-MM-DD` text                      |
//! | `time`         | time           | `HH[:MM[:SS]]` text                    |
//! | `string_list`  | -              | any value or list, elements stringified|
//! | `number_list`  | -              | any value or list, elements as numbers |
//!
//! ## Operations
//!
//! - [`validate`] / [`validate_with_policy`] check choices, types and required keys
//! - [`fill_defaults`] inserts defaults of missing optional parameters
//! - [`convert_types`] coerces values in place (idempotent)

mod contract;
mod def;
mod value;

pub use contract::{
    contract_doc, convert_types, fill_defaults, param_map_from_json, redacted, validate,
    validate_with_policy, ParamContract, UnknownParamPolicy,
};
pub use def::{ParameterDef, ParameterDoc};
pub use value::{is_truthy, ParamMap, ParamType, ParamValue};
