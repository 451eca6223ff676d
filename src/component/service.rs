use crate::params::{contract_doc, ParamContract, ParameterDef, ParameterDoc};
use crate::render::{DEFAULT_INPUT_TYPES, DEFAULT_OUTPUT_TYPES};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declaration of one callable service (sub-resource) of a component.
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    desc: String,
    params: Option<ParamContract>,
    positional_params: Vec<String>,
    allow_params_in_body: bool,
    output_types: Vec<String>,
    input_types: Option<Vec<String>>,
}

impl ServiceDescriptor {
    /// A service with no parameters and the default input/output types.
    #[must_use]
    pub fn new(desc: impl Into<String>) -> Self {
        Self {
            desc: desc.into(),
            params: None,
            positional_params: Vec::new(),
            allow_params_in_body: false,
            output_types: DEFAULT_OUTPUT_TYPES.iter().map(|s| (*s).to_string()).collect(),
            input_types: Some(DEFAULT_INPUT_TYPES.iter().map(|s| (*s).to_string()).collect()),
        }
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, def: ParameterDef) -> Self {
        self.params
            .get_or_insert_with(ParamContract::new)
            .insert(name.into(), def);
        self
    }

    /// Names filled left-to-right from path segments after the service name.
    #[must_use]
    pub fn positional<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.positional_params = names.into_iter().map(Into::into).collect();
        self
    }

    /// Let the parsed request body supply parameters not given in the URL.
    #[must_use]
    pub fn params_in_body(mut self) -> Self {
        self.allow_params_in_body = true;
        self
    }

    #[must_use]
    pub fn output_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Accepted body content types. Include `""` to accept any body unparsed.
    #[must_use]
    pub fn input_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Refuse any request body.
    #[must_use]
    pub fn no_input(mut self) -> Self {
        self.input_types = None;
        self
    }

    #[must_use]
    pub fn desc(&self) -> &str {
        &self.desc
    }

    #[must_use]
    pub fn params(&self) -> Option<&ParamContract> {
        self.params.as_ref()
    }

    #[must_use]
    pub fn positional_params(&self) -> &[String] {
        &self.positional_params
    }

    #[must_use]
    pub fn allows_params_in_body(&self) -> bool {
        self.allow_params_in_body
    }

    #[must_use]
    pub fn allowed_output_types(&self) -> &[String] {
        &self.output_types
    }

    /// `None` when the service takes no body at all.
    #[must_use]
    pub fn allowed_input_types(&self) -> Option<&[String]> {
        self.input_types.as_deref()
    }

    /// Published description of this service, addressed at `uri`.
    #[must_use]
    pub fn doc(&self, uri: String) -> ServiceDoc {
        ServiceDoc {
            desc: self.desc.clone(),
            uri,
            params: self.params.as_ref().map(contract_doc),
            positional_params: self.positional_params.clone(),
            output_types: self.output_types.clone(),
            input_types: self.input_types.clone(),
            allow_params_in_body: self.allow_params_in_body,
        }
    }
}

/// Serialized service entry in a resource's or component's service table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDoc {
    pub desc: String,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<BTreeMap<String, ParameterDoc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positional_params: Vec<String>,
    pub output_types: Vec<String>,
    pub input_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_params_in_body: bool,
}
