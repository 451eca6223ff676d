use crate::component::{CatalogEntry, Component, ComponentMeta, ServiceDoc};
use crate::params::{ParamContract, ParamMap, ParamType, ParameterDef};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Default shown for parameters a partial resource has already fixed.
pub const PROVIDED_BY_SPECIALIZATION: &str = "*** PROVIDED BY COMPONENT SPECIALIZATION ***";

/// Private partition: never shown to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateDef {
    /// `<code prefix>/<component>`; absent on records that extend a partial
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_uri: Option<String>,
    #[serde(default)]
    pub params: ParamMap,
    #[serde(default)]
    pub resource_creation_params: ParamMap,
}

/// Public partition. All three fields are mandatory in a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicDef {
    pub uri: String,
    pub name: String,
    pub desc: String,
}

/// A persisted resource or partial resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    pub private: PrivateDef,
    pub public: PublicDef,
    /// Name of the partial resource this one extends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
}

impl ResourceDefinition {
    /// Component name from the code reference (its last path segment).
    #[must_use]
    pub fn component_name(&self) -> Option<&str> {
        self.private
            .code_uri
            .as_deref()
            .and_then(|uri| uri.rsplit('/').next())
            .filter(|name| !name.is_empty())
    }

    /// Public view with the service table resolved below this resource.
    #[must_use]
    pub fn public_doc(&self, component: &Component) -> ResourceDoc {
        ResourceDoc {
            uri: self.public.uri.clone(),
            name: self.public.name.clone(),
            desc: self.public.desc.clone(),
            services: component.services_doc(&self.public.uri),
        }
    }

    #[must_use]
    pub fn catalog_entry(&self) -> CatalogEntry {
        CatalogEntry {
            uri: self.public.uri.clone(),
            desc: self.public.desc.clone(),
        }
    }
}

/// `GET <resource prefix>/<name>` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceDoc {
    pub uri: String,
    pub name: String,
    pub desc: String,
    pub services: BTreeMap<String, ServiceDoc>,
}

/// Reply to a successful creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedResource {
    pub status: String,
    pub name: String,
    pub uri: String,
}

/// One row of a resource listing. Unreadable records stay visible by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ListingEntry {
    Found(CatalogEntry),
    Missing(&'static str),
}

/// Contract of the `resource_creation_params` section.
///
/// `base_desc` replaces the generated description default when creating
/// through a partial resource.
#[must_use]
pub fn creation_contract(component_name: &str, base_desc: Option<&str>) -> ParamContract {
    let desc_default = base_desc.map_or_else(|| format!("A '{component_name}' resource"), str::to_string);
    let mut contract = ParamContract::new();
    contract.insert(
        "suggested_name".to_string(),
        ParameterDef::required(ParamType::String, "The suggested name under which the resource should be stored"),
    );
    contract.insert(
        "desc".to_string(),
        ParameterDef::optional(ParamType::String, "Specifies a description for this new resource", desc_default),
    );
    contract.insert(
        "specialized".to_string(),
        ParameterDef::optional(
            ParamType::Boolean,
            "Specifies if we want to create a specialized component resource (true) or a normal resource (false)",
            false,
        ),
    );
    contract
}

/// Contract of a component as advertised through one of its partial resources.
///
/// Identity fields come from the partial, the option to create yet another
/// partial is removed, and every parameter the partial (or its chain) fixes
/// is shown with a sentinel default and marked non-settable. `fixed` must be
/// the partial's effective parameters after chain resolution.
#[must_use]
pub fn specialized_overwrite(mut meta: ComponentMeta, partial: &ResourceDefinition, fixed: &ParamMap) -> ComponentMeta {
    meta.name = partial.public.name.clone();
    meta.desc = partial.public.desc.clone();
    meta.uri = partial.public.uri.clone();
    meta.doc = format!("{}/doc", meta.uri);

    meta.resource_creation_params.remove("specialized");
    if let Some(desc) = meta.resource_creation_params.get_mut("desc") {
        desc.default = Some(Value::String(partial.public.desc.clone()));
    }

    for name in fixed.keys() {
        if let Some(doc) = meta.params.get_mut(name) {
            doc.default = Some(Value::String(PROVIDED_BY_SPECIALIZATION.to_string()));
            doc.is_settable = Some(false);
        }
    }

    for (service, doc) in &mut meta.services {
        doc.uri = format!("{}/{service}", meta.uri);
    }
    meta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ServiceDescriptor;
    use crate::component::{ServiceCall, ServiceResult};
    use crate::error::EngineFault;
    use serde_json::json;

    fn noop(_: &ServiceCall<'_>) -> Result<ServiceResult, EngineFault> {
        Ok(ServiceResult::no_content())
    }

    fn db_component() -> Component {
        Component::builder("Db")
            .param("account_name", ParameterDef::required(ParamType::String, "account"))
            .param("account_password", ParameterDef::required(ParamType::Password, "secret"))
            .service("entries", ServiceDescriptor::new("rows"), noop)
            .build()
            .unwrap()
    }

    fn partial() -> ResourceDefinition {
        serde_json::from_value(json!({
            "private": {
                "code_uri": "/code/Db",
                "params": {"account_password": "hunter2"},
                "resource_creation_params": {"suggested_name": "SecretDb", "specialized": true}
            },
            "public": {"uri": "/specialized/SecretDb", "name": "SecretDb", "desc": "Db with a fixed password"}
        }))
        .unwrap()
    }

    #[test]
    fn test_overwrite_masks_fixed_params() {
        let p = partial();
        let meta = specialized_overwrite(db_component().meta("/code"), &p, &p.private.params);
        let pw = &meta.params["account_password"];
        assert_eq!(pw.default, Some(json!(PROVIDED_BY_SPECIALIZATION)));
        assert_eq!(pw.is_settable, Some(false));
        assert_eq!(meta.params["account_name"].is_settable, None);
        assert!(!meta.resource_creation_params.contains_key("specialized"));
        assert_eq!(
            meta.resource_creation_params["desc"].default,
            Some(json!("Db with a fixed password"))
        );
        assert_eq!(meta.uri, "/specialized/SecretDb");
        assert_eq!(meta.doc, "/specialized/SecretDb/doc");
        assert_eq!(meta.services["entries"].uri, "/specialized/SecretDb/entries");
    }

    #[test]
    fn test_missing_public_field_is_malformed() {
        let broken = serde_json::from_value::<ResourceDefinition>(json!({
            "private": {"code_uri": "/code/Db", "params": {}},
            "public": {"uri": "/resource/x", "name": "x"}
        }));
        assert!(broken.is_err());
    }

    #[test]
    fn test_component_name_from_code_uri() {
        assert_eq!(partial().component_name(), Some("Db"));
    }

    #[test]
    fn test_creation_contract_desc_default() {
        let c = creation_contract("Db", None);
        assert_eq!(
            c["desc"].default_value().map(ToString::to_string),
            Some("A 'Db' resource".to_string())
        );
        let c = creation_contract("Db", Some("inherited"));
        assert_eq!(
            c["desc"].default_value().map(ToString::to_string),
            Some("inherited".to_string())
        );
        assert!(c["suggested_name"].is_required());
    }
}
