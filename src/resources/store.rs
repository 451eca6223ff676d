use super::definition::{
    creation_contract, CreatedResource, ListingEntry, PrivateDef, PublicDef, ResourceDefinition,
};
use crate::component::Component;
use crate::config::Prefixes;
use crate::error::{EngineFault, StorageError};
use crate::params::{
    convert_types, fill_defaults, is_truthy, param_map_from_json, redacted, validate,
    validate_with_policy, ParamMap, ParamValue, UnknownParamPolicy,
};
use crate::storage::BlobStore;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Extension of plain resource records.
pub const RESOURCE_EXT: &str = ".rxr";
/// Extension of partial resource records.
pub const PARTIAL_EXT: &str = ".prxr";

const CREATION_KEYS: [&str; 2] = ["params", "resource_creation_params"];

static NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_\-]*$").expect("resource name regex should be valid"));

/// What happens when a creation request reuses an existing name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameCollision {
    /// Fail with `Conflict`. The check and the write are one atomic store
    /// operation, so of two concurrent creates for a name one gets `Conflict`.
    #[default]
    Reject,
    /// Replace the stored record
    Overwrite,
}

/// A partial resource used as the base of a creation request.
#[derive(Debug, Clone)]
pub struct BaseExtension<'a> {
    pub name: &'a str,
    /// Loaded with its chain resolved
    pub definition: &'a ResourceDefinition,
}

/// Persistence and inheritance resolution of resource definitions.
///
/// Records are read from the blob store on every call. Nothing is cached.
pub struct ResourceStore {
    blobs: Arc<dyn BlobStore>,
    prefixes: Prefixes,
    collision: NameCollision,
    max_extension_depth: usize,
    unknown_params: UnknownParamPolicy,
}

impl ResourceStore {
    #[must_use]
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            blobs,
            prefixes: Prefixes::default(),
            collision: NameCollision::default(),
            max_extension_depth: 16,
            unknown_params: UnknownParamPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_prefixes(mut self, prefixes: Prefixes) -> Self {
        self.prefixes = prefixes;
        self
    }

    #[must_use]
    pub fn with_collision(mut self, collision: NameCollision) -> Self {
        self.collision = collision;
        self
    }

    #[must_use]
    pub fn with_max_extension_depth(mut self, depth: usize) -> Self {
        self.max_extension_depth = depth;
        self
    }

    #[must_use]
    pub fn with_unknown_params(mut self, policy: UnknownParamPolicy) -> Self {
        self.unknown_params = policy;
        self
    }

    #[must_use]
    pub fn prefixes(&self) -> &Prefixes {
        &self.prefixes
    }

    fn key(name: &str, is_partial: bool) -> String {
        let ext = if is_partial { PARTIAL_EXT } else { RESOURCE_EXT };
        format!("{name}{ext}")
    }

    /// Create a resource (or a partial resource) from `component`.
    ///
    /// `request` is the client body with `params` and
    /// `resource_creation_params`. When `base` is given, its fixed
    /// parameters override anything the client sent for the same keys and
    /// are left out of the stored record.
    pub fn create(
        &self,
        component: &Component,
        request: &Value,
        base: Option<BaseExtension<'_>>,
    ) -> Result<CreatedResource, EngineFault> {
        let Some(sections) = request.as_object() else {
            return Err(EngineFault::bad_request(
                "Malformed resource parameter definition. Has to be a dictionary.",
            ));
        };
        if let Some(unknown) = sections.keys().find(|k| !CREATION_KEYS.contains(&k.as_str())) {
            return Err(EngineFault::bad_request(format!(
                "Malformed resource parameter definition. Unknown key: {unknown}"
            )));
        }

        let mut params = param_map_from_json(sections.get("params"), "params")?;
        let mut rcp = param_map_from_json(sections.get("resource_creation_params"), "resource_creation_params")?;

        let inherited: &ParamMap = match &base {
            Some(b) => &b.definition.private.params,
            None => &EMPTY_PARAMS,
        };
        for (k, v) in inherited {
            params.insert(k.clone(), v.clone());
        }

        let specialized = match rcp.get("specialized") {
            Some(ParamValue::Bool(b)) => *b,
            Some(ParamValue::Text(s)) => is_truthy(s),
            _ => false,
        };

        validate_with_policy(&params, component.params(), "params", specialized, self.unknown_params)?;
        let rcp_contract = creation_contract(
            component.name(),
            base.as_ref().map(|b| b.definition.public.desc.as_str()),
        );
        validate(&rcp, &rcp_contract, "resource_creation_params", false)?;
        convert_types(component.params(), &mut params)?;
        fill_defaults(&rcp_contract, &mut rcp);
        convert_types(&rcp_contract, &mut rcp)?;
        if !specialized {
            fill_defaults(component.params(), &mut params);
        }
        params.retain(|k, _| !inherited.contains_key(k));

        let name = rcp
            .get("suggested_name")
            .and_then(ParamValue::as_str)
            .unwrap_or_default()
            .to_string();
        if !NAME_REGEX.is_match(&name) {
            return Err(EngineFault::bad_request(format!(
                "Resource name '{name}' may only contain letters, digits, '_' and '-'"
            )));
        }
        let desc = rcp
            .get("desc")
            .and_then(ParamValue::as_str)
            .unwrap_or_default()
            .to_string();

        let key = Self::key(&name, specialized);

        let prefix = if specialized {
            &self.prefixes.specialized
        } else {
            &self.prefixes.resource
        };
        let uri = format!("{prefix}/{name}");
        let definition = ResourceDefinition {
            private: PrivateDef {
                code_uri: base
                    .is_none()
                    .then(|| component.code_uri(&self.prefixes.code)),
                params,
                resource_creation_params: rcp,
            },
            public: PublicDef {
                uri: uri.clone(),
                name: name.clone(),
                desc,
            },
            extends: base.as_ref().map(|b| b.name.to_string()),
        };

        let bytes = to_pretty_json(&definition)
            .map_err(|e| EngineFault::internal(format!("cannot serialize resource '{name}': {e}")))?;
        let stored = match self.collision {
            NameCollision::Reject => self.blobs.store_new(&key, &bytes),
            NameCollision::Overwrite => self.blobs.store(&key, &bytes),
        };
        stored.map_err(|e| match e {
            StorageError::AlreadyExists(_) => {
                EngineFault::Conflict(format!("Resource '{name}' already exists"))
            }
            other => EngineFault::internal(format!("cannot store resource '{name}': {other}")),
        })?;

        info!(
            resource = %name,
            component = %component.name(),
            specialized = specialized,
            extends = ?definition.extends,
            params = ?redacted(&definition.private.params, component.params()),
            "Resource created"
        );
        Ok(CreatedResource {
            status: "created".to_string(),
            name,
            uri,
        })
    }

    /// Load one record without following its chain.
    fn load_record(&self, name: &str, is_partial: bool) -> Result<ResourceDefinition, EngineFault> {
        let not_found = || {
            EngineFault::not_found(if is_partial {
                format!("Cannot find specialized component resource '{name}'")
            } else {
                format!("Cannot find resource '{name}'")
            })
        };
        let key = Self::key(name, is_partial);
        let bytes = match self.blobs.load(&key) {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound(_) | StorageError::InvalidKey(_)) => return Err(not_found()),
            Err(e) => {
                error!(key = %key, error = %e, "Resource record unreadable");
                return Err(not_found());
            }
        };
        serde_json::from_slice(&bytes).map_err(|e| {
            error!(key = %key, error = %e, "Malformed resource record");
            not_found()
        })
    }

    /// Load a record and resolve its extension chain.
    ///
    /// Missing parameters are filled from each base in turn (closest first)
    /// and the code reference is taken from the base. A cycle, a chain deeper
    /// than the configured limit or a record without a code reference is
    /// logged and reported as not found.
    pub fn load(&self, name: &str, is_partial: bool) -> Result<ResourceDefinition, EngineFault> {
        let mut definition = self.load_record(name, is_partial)?;
        let mut visited: HashSet<String> = HashSet::new();
        if is_partial {
            visited.insert(name.to_string());
        }

        let mut next = definition.extends.clone();
        let mut depth = 0usize;
        while let Some(base_name) = next {
            depth += 1;
            if depth > self.max_extension_depth {
                error!(
                    resource = %name,
                    max_depth = self.max_extension_depth,
                    "Extension chain too deep"
                );
                return Err(EngineFault::not_found(format!("Cannot find resource '{name}'")));
            }
            if !visited.insert(base_name.clone()) {
                error!(resource = %name, base = %base_name, "Extension cycle detected");
                return Err(EngineFault::not_found(format!("Cannot find resource '{name}'")));
            }
            let base = self.load_record(&base_name, true).map_err(|e| {
                warn!(resource = %name, base = %base_name, "Base of resource is missing");
                e
            })?;
            for (k, v) in base.private.params {
                definition.private.params.entry(k).or_insert(v);
            }
            if base.private.code_uri.is_some() {
                definition.private.code_uri = base.private.code_uri;
            }
            next = base.extends;
        }

        if definition.component_name().is_none() {
            error!(resource = %name, "Resource record has no code reference");
            return Err(EngineFault::not_found(format!("Cannot find resource '{name}'")));
        }
        Ok(definition)
    }

    /// Load by URI; the name is the last path segment.
    pub fn read(&self, uri: &str, is_partial: bool) -> Result<ResourceDefinition, EngineFault> {
        self.load(name_from_uri(uri), is_partial)
    }

    pub fn read_public(&self, uri: &str, is_partial: bool) -> Result<PublicDef, EngineFault> {
        self.read(uri, is_partial).map(|d| d.public)
    }

    #[must_use]
    pub fn exists(&self, name: &str, is_partial: bool) -> bool {
        self.blobs.exists(&Self::key(name, is_partial))
    }

    pub fn delete(&self, uri: &str, is_partial: bool) -> Result<(), EngineFault> {
        let name = name_from_uri(uri);
        match self.blobs.delete(&Self::key(name, is_partial)) {
            Ok(()) => {
                info!(resource = %name, partial = is_partial, "Resource deleted");
                Ok(())
            }
            Err(StorageError::NotFound(_) | StorageError::InvalidKey(_)) => {
                Err(EngineFault::not_found(format!("Cannot find resource '{name}'")))
            }
            Err(e) => Err(EngineFault::internal(format!("cannot delete resource '{name}': {e}"))),
        }
    }

    /// `{name: {uri, desc}}` of every stored resource (or partial resource).
    pub fn list(&self, partial: bool) -> Result<BTreeMap<String, ListingEntry>, EngineFault> {
        let ext = if partial { PARTIAL_EXT } else { RESOURCE_EXT };
        let names = self
            .blobs
            .list(ext)
            .map_err(|e| EngineFault::internal(format!("cannot list resources: {e}")))?;
        Ok(names
            .into_iter()
            .filter(|n| !n.starts_with('_'))
            .map(|n| {
                let entry = match self.load_record(&n, partial) {
                    Ok(d) => ListingEntry::Found(d.catalog_entry()),
                    Err(_) => ListingEntry::Missing("Not found"),
                };
                (n, entry)
            })
            .collect())
    }
}

static EMPTY_PARAMS: Lazy<ParamMap> = Lazy::new(ParamMap::new);

/// Last non-empty path segment.
#[must_use]
pub fn name_from_uri(uri: &str) -> &str {
    uri.trim_end_matches('/').rsplit('/').next().unwrap_or(uri)
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}
