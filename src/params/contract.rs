use super::def::{ParameterDef, ParameterDoc};
use super::value::{ParamMap, ParamType, ParamValue};
use crate::error::EngineFault;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Declared parameters keyed by name.
pub type ParamContract = BTreeMap<String, ParameterDef>;

/// What to do with supplied parameters that the contract does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownParamPolicy {
    /// Skip them silently
    #[default]
    Ignore,
    /// Fail with `BadRequest`
    Reject,
}

/// Check `params` against `contract` with unknown keys ignored.
///
/// See [`validate_with_policy`].
pub fn validate(
    params: &ParamMap,
    contract: &ParamContract,
    section: &str,
    allow_partial: bool,
) -> Result<(), EngineFault> {
    validate_with_policy(params, contract, section, allow_partial, UnknownParamPolicy::Ignore)
}

/// Check `params` against `contract`.
///
/// Every declared key is checked for choice membership (element-wise for
/// lists) and for convertibility to its runtime type. Unless `allow_partial`
/// is set, every required key must be present. `section` names the request
/// section in error messages.
pub fn validate_with_policy(
    params: &ParamMap,
    contract: &ParamContract,
    section: &str,
    allow_partial: bool,
    policy: UnknownParamPolicy,
) -> Result<(), EngineFault> {
    for (name, value) in params {
        let Some(def) = contract.get(name) else {
            match policy {
                UnknownParamPolicy::Ignore => continue,
                UnknownParamPolicy::Reject => {
                    return Err(EngineFault::bad_request(format!(
                        "Unknown parameter in '{section}' section: {name}"
                    )))
                }
            }
        };

        if def.choices().is_some() {
            if let ParamValue::List(items) = value {
                if let Some(bad) = items.iter().find(|v| !def.is_choice(v)) {
                    return Err(EngineFault::bad_request(format!(
                        "List value '{bad}' for parameter '{name}' is not one of the permissible choices."
                    )));
                }
            } else if !def.is_choice(value) {
                return Err(EngineFault::bad_request(format!(
                    "Value '{value}' for parameter '{name}' is not one of the permissible choices."
                )));
            }
        }

        def.param_type().coerce(value).map_err(|reason| {
            EngineFault::bad_request(format!(
                "Incompatible type for parameter '{name}' in section '{section}': {reason}"
            ))
        })?;
    }

    if !allow_partial {
        if let Some((name, _)) = contract
            .iter()
            .find(|(name, def)| def.is_required() && !params.contains_key(*name))
        {
            return Err(EngineFault::mandatory_missing(format!(
                "Missing mandatory parameter '{name}' in section '{section}'"
            )));
        }
    }
    Ok(())
}

/// Insert the default of every optional parameter missing from `params`.
///
/// Scalar defaults of list-typed parameters are wrapped in a one-element list.
pub fn fill_defaults(contract: &ParamContract, params: &mut ParamMap) {
    for (name, def) in contract {
        if def.is_required() || params.contains_key(name) {
            continue;
        }
        if let Some(default) = def.default_value() {
            let value = match default {
                ParamValue::List(_) => default.clone(),
                scalar if def.is_list() => ParamValue::List(vec![scalar.clone()]),
                scalar => scalar.clone(),
            };
            params.insert(name.clone(), value);
        }
    }
}

/// Coerce every declared key to its runtime type, in place.
///
/// Idempotent: an already converted mapping comes back unchanged.
pub fn convert_types(contract: &ParamContract, params: &mut ParamMap) -> Result<(), EngineFault> {
    for (name, value) in params.iter_mut() {
        if let Some(def) = contract.get(name) {
            *value = def.param_type().coerce(value).map_err(|reason| {
                EngineFault::bad_request(format!("Incompatible type for parameter '{name}': {reason}"))
            })?;
        }
    }
    Ok(())
}

/// Client facing documentation for a whole contract.
#[must_use]
pub fn contract_doc(contract: &ParamContract) -> BTreeMap<String, ParameterDoc> {
    contract
        .iter()
        .map(|(name, def)| (name.clone(), def.doc()))
        .collect()
}

/// Build a parameter map from a JSON section of a request.
///
/// A missing or `null` section is an empty map, anything other than an
/// object is a `BadRequest`.
pub fn param_map_from_json(section_value: Option<&Value>, section: &str) -> Result<ParamMap, EngineFault> {
    match section_value {
        None | Some(Value::Null) => Ok(ParamMap::new()),
        Some(Value::Object(map)) => Ok(map
            .iter()
            .map(|(k, v)| (k.clone(), ParamValue::from(v.clone())))
            .collect()),
        Some(_) => Err(EngineFault::bad_request(format!(
            "The '{section}' section has to be a dictionary"
        ))),
    }
}

/// Loggable view of `params` with secret-text values masked.
#[must_use]
pub fn redacted(params: &ParamMap, contract: &ParamContract) -> BTreeMap<String, String> {
    params
        .iter()
        .map(|(name, value)| {
            let secret = contract
                .get(name)
                .is_some_and(|def| def.param_type() == ParamType::Password);
            let shown = if secret {
                "<REDACTED>".to_string()
            } else {
                value.to_string()
            };
            (name.clone(), shown)
        })
        .collect()
}
