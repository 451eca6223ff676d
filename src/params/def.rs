use super::value::{ParamType, ParamValue};
use crate::error::DefinitionError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declaration of one parameter: type, description, requiredness, default
/// and an optional choice set.
///
/// A required parameter never carries a default and an optional one always
/// does. The constructors enforce this, so an invalid definition cannot be
/// built.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDef {
    ptype: ParamType,
    desc: String,
    required: bool,
    default: Option<ParamValue>,
    choices: Option<Vec<ParamValue>>,
}

impl ParameterDef {
    /// Build a definition, rejecting required+default and optional-without-default.
    pub fn new(
        ptype: ParamType,
        desc: impl Into<String>,
        required: bool,
        default: Option<ParamValue>,
    ) -> Result<Self, DefinitionError> {
        match (required, &default) {
            (true, Some(_)) => return Err(DefinitionError::RequiredWithDefault),
            (false, None) => return Err(DefinitionError::OptionalWithoutDefault),
            _ => {}
        }
        Ok(Self {
            ptype,
            desc: desc.into(),
            required,
            default,
            choices: None,
        })
    }

    /// A required parameter.
    #[must_use]
    pub fn required(ptype: ParamType, desc: impl Into<String>) -> Self {
        Self {
            ptype,
            desc: desc.into(),
            required: true,
            default: None,
            choices: None,
        }
    }

    /// An optional parameter with its default.
    #[must_use]
    pub fn optional(ptype: ParamType, desc: impl Into<String>, default: impl Into<ParamValue>) -> Self {
        Self {
            ptype,
            desc: desc.into(),
            required: false,
            default: Some(default.into()),
            choices: None,
        }
    }

    /// Restrict accepted values to `choices`.
    ///
    /// Fails when the type does not support choices or when the default is
    /// not one of them.
    pub fn with_choices<I, V>(mut self, choices: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        if !self.ptype.supports_choices() {
            return Err(DefinitionError::ChoicesNotSupported(self.ptype.wire_name()));
        }
        let choices: Vec<ParamValue> = choices.into_iter().map(Into::into).collect();
        self.choices = Some(choices);
        if let Some(default) = &self.default {
            if let Some(bad) = default.elements().iter().find(|e| !self.is_choice(e)) {
                return Err(DefinitionError::DefaultNotInChoices(bad.to_string()));
            }
        }
        Ok(self)
    }

    #[must_use]
    pub fn param_type(&self) -> ParamType {
        self.ptype
    }

    #[must_use]
    pub fn desc(&self) -> &str {
        &self.desc
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    #[must_use]
    pub fn default_value(&self) -> Option<&ParamValue> {
        self.default.as_ref()
    }

    #[must_use]
    pub fn choices(&self) -> Option<&[ParamValue]> {
        self.choices.as_deref()
    }

    #[must_use]
    pub fn is_list(&self) -> bool {
        self.ptype.is_list()
    }

    /// Choice membership compares string forms, so `"10"` matches a numeric `10`.
    #[must_use]
    pub fn is_choice(&self, value: &ParamValue) -> bool {
        match &self.choices {
            None => true,
            Some(choices) => {
                let wanted = value.to_string();
                choices.iter().any(|c| c.to_string() == wanted)
            }
        }
    }

    /// Client facing description of this parameter.
    #[must_use]
    pub fn doc(&self) -> ParameterDoc {
        ParameterDoc {
            ptype: self.ptype,
            desc: self.desc.clone(),
            required: self.required,
            default: self.default.as_ref().map(ParamValue::to_json),
            val_choices: self
                .choices
                .as_ref()
                .map(|c| c.iter().map(ParamValue::to_json).collect()),
            multi_choice: (self.choices.is_some() && self.is_list()).then_some(true),
            is_settable: None,
        }
    }
}

/// Serialized form of a [`ParameterDef`] as published in component and
/// service documentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDoc {
    #[serde(rename = "type")]
    pub ptype: ParamType,
    pub desc: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val_choices: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_choice: Option<bool>,
    /// `Some(false)` once a partial resource has fixed the value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_settable: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_with_default_rejected() {
        let err = ParameterDef::new(ParamType::String, "x", true, Some("a".into())).unwrap_err();
        assert_eq!(err, DefinitionError::RequiredWithDefault);
    }

    #[test]
    fn test_optional_without_default_rejected() {
        let err = ParameterDef::new(ParamType::Number, "x", false, None).unwrap_err();
        assert_eq!(err, DefinitionError::OptionalWithoutDefault);
    }

    #[test]
    fn test_choices_only_for_supported_types() {
        let err = ParameterDef::required(ParamType::Boolean, "flag")
            .with_choices(["yes"])
            .unwrap_err();
        assert_eq!(err, DefinitionError::ChoicesNotSupported("boolean"));

        assert!(ParameterDef::required(ParamType::NumberList, "n")
            .with_choices([1, 2, 3])
            .is_ok());
    }

    #[test]
    fn test_default_must_be_a_choice() {
        let err = ParameterDef::optional(ParamType::String, "x", "C")
            .with_choices(["A", "B"])
            .unwrap_err();
        assert_eq!(err, DefinitionError::DefaultNotInChoices("C".to_string()));
    }

    #[test]
    fn test_doc_shape() {
        let def = ParameterDef::optional(ParamType::StringList, "colors", "red")
            .with_choices(["red", "green"])
            .unwrap();
        let doc = serde_json::to_value(def.doc()).unwrap();
        assert_eq!(
            doc,
            json!({
                "type": "string_list",
                "desc": "colors",
                "required": false,
                "default": "red",
                "val_choices": ["red", "green"],
                "multi_choice": true
            })
        );
        assert!(def.is_list());
    }
}
