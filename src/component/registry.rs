use super::Component;
use crate::error::DefinitionError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Catalog entry returned by `GET <code prefix>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub uri: String,
    pub desc: String,
}

/// Name-indexed set of registered components.
///
/// Populated once at startup, then shared read-only behind an `Arc`.
#[derive(Debug, Default, Clone)]
pub struct ComponentRegistry {
    components: BTreeMap<String, Arc<Component>>,
}

impl ComponentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in components.
    pub fn with_builtins() -> Result<Self, DefinitionError> {
        let mut registry = Self::new();
        for component in super::builtin::all()? {
            registry.register(component)?;
        }
        Ok(registry)
    }

    /// Add a component. Names are unique.
    pub fn register(&mut self, component: Component) -> Result<(), DefinitionError> {
        let name = component.name().to_string();
        if self.components.contains_key(&name) {
            return Err(DefinitionError::DuplicateComponent(name));
        }
        info!(
            component = %name,
            services = component.services().count(),
            params = component.params().len(),
            "Component registered"
        );
        self.components.insert(name, Arc::new(component));
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Component>> {
        self.components.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// `{name: {uri, desc}}` for every component not starting with `_`.
    #[must_use]
    pub fn catalog(&self, code_prefix: &str) -> BTreeMap<String, CatalogEntry> {
        self.components
            .values()
            .filter(|c| !c.name().starts_with('_'))
            .map(|c| {
                (
                    c.name().to_string(),
                    CatalogEntry {
                        uri: c.code_uri(code_prefix),
                        desc: c.desc().to_string(),
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = ComponentRegistry::new();
        registry
            .register(Component::builder("A").build().unwrap())
            .unwrap();
        let err = registry
            .register(Component::builder("A").build().unwrap())
            .unwrap_err();
        assert_eq!(err, DefinitionError::DuplicateComponent("A".into()));
    }

    #[test]
    fn test_catalog_hides_private_components() {
        let mut registry = ComponentRegistry::new();
        registry
            .register(Component::builder("Visible").desc("v").build().unwrap())
            .unwrap();
        registry
            .register(Component::builder("_Hidden").build().unwrap())
            .unwrap();
        let catalog = registry.catalog("/code");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog["Visible"].uri, "/code/Visible");
        assert!(registry.get("_Hidden").is_some());
    }

    #[test]
    fn test_builtins_register() {
        let registry = ComponentRegistry::with_builtins().unwrap();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["SampleComponent", "TestComponent", "TimeRange"]);
    }
}
