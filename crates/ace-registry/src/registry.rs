//! The component registry: O(1) name→entry lookup with hot-swap
//!
//! Lookup never fails hard: a version outside an entry's supported set
//! still resolves (best-effort render) but is flagged as coerced for
//! diagnostics; an unknown name resolves to the placeholder.

use crate::renderer::{ComponentRenderer, StandardRenderer};
use ace_schema::catalog::ALLOWED_COMPONENTS;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

/// One registered renderable implementation
#[derive(Clone)]
pub struct RegistryEntry {
    /// Component name, the lookup key
    pub component: String,
    /// Supported contract versions
    pub versions: Vec<u32>,
    /// Props the renderer expects; absence is a render-walk warning
    pub required_props: Vec<String>,
    pub description: String,
    pub renderer: Arc<dyn ComponentRenderer>,
}

impl RegistryEntry {
    #[must_use]
    pub fn new(component: impl Into<String>, renderer: Arc<dyn ComponentRenderer>) -> Self {
        Self {
            component: component.into(),
            versions: vec![1],
            required_props: Vec::new(),
            description: String::new(),
            renderer,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_versions(mut self, versions: Vec<u32>) -> Self {
        self.versions = versions;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_required_props(mut self, props: Vec<String>) -> Self {
        self.required_props = props;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether this entry supports the requested contract version
    #[inline]
    #[must_use]
    pub fn supports_version(&self, version: u32) -> bool {
        self.versions.contains(&version)
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("component", &self.component)
            .field("versions", &self.versions)
            .field("required_props", &self.required_props)
            .finish_non_exhaustive()
    }
}

/// Outcome of a registry lookup; never an error
#[derive(Debug, Clone)]
pub enum Resolution {
    /// A known component; `version_coerced` flags a best-effort render
    /// under an unsupported requested version
    Resolved {
        entry: Arc<RegistryEntry>,
        version_coerced: bool,
    },
    /// Unknown name; render the placeholder
    Placeholder { requested: String },
}

impl Resolution {
    #[inline]
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }
}

/// Name-keyed registry of renderable implementations.
///
/// Entries may be replaced at runtime (hot-swap) without invalidating
/// already-rendered instances until the next render pass.
#[derive(Debug)]
pub struct ComponentRegistry {
    entries: DashMap<String, Arc<RegistryEntry>>,
}

impl ComponentRegistry {
    /// Create an empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Create a registry pre-populated with the built-in base set: one
    /// [`StandardRenderer`] entry per catalog name
    #[must_use]
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.install_defaults();
        registry
    }

    fn install_defaults(&self) {
        for name in ALLOWED_COMPONENTS {
            self.register(
                RegistryEntry::new(*name, Arc::new(StandardRenderer::new(*name)))
                    .with_description(format!("built-in {name}")),
            );
        }
    }

    /// Register (or replace) an entry
    pub fn register(&self, entry: RegistryEntry) {
        self.entries
            .insert(entry.component.clone(), Arc::new(entry));
    }

    /// Replace an entry at runtime, returning the previous one
    pub fn hot_swap(&self, entry: RegistryEntry) -> Option<Arc<RegistryEntry>> {
        tracing::debug!(component = %entry.component, "hot-swapping registry entry");
        self.entries.insert(entry.component.clone(), Arc::new(entry))
    }

    /// Remove an entry, returning whether it existed
    pub fn remove(&self, component: &str) -> bool {
        self.entries.remove(component).is_some()
    }

    /// Restore the built-in base set, dropping everything else.
    /// Exposed for test isolation.
    pub fn reset(&self) {
        self.entries.clear();
        self.install_defaults();
    }

    /// Resolve a name and requested version. O(1) by name.
    #[must_use]
    pub fn resolve(&self, component: &str, version: u32) -> Resolution {
        match self.entries.get(component) {
            Some(entry) => {
                let entry = Arc::clone(entry.value());
                let version_coerced = !entry.supports_version(version);
                Resolution::Resolved {
                    entry,
                    version_coerced,
                }
            }
            None => Resolution::Placeholder {
                requested: component.to_string(),
            },
        }
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, component: &str) -> bool {
        self.entries.contains_key(component)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All registered component names
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{PlaceholderRenderer, RenderContext, RenderError};
    use serde_json::Value;

    #[test]
    fn defaults_cover_the_catalog() {
        let registry = ComponentRegistry::with_defaults();
        assert_eq!(registry.len(), ALLOWED_COMPONENTS.len());
        for name in ALLOWED_COMPONENTS {
            assert!(registry.contains(name));
        }
    }

    #[test]
    fn resolve_known_component() {
        let registry = ComponentRegistry::with_defaults();
        let Resolution::Resolved { entry, version_coerced } = registry.resolve("kpi_card", 1)
        else {
            panic!("expected resolution");
        };
        assert_eq!(entry.component, "kpi_card");
        assert!(!version_coerced);
    }

    #[test]
    fn unsupported_version_flags_coercion_but_still_resolves() {
        let registry = ComponentRegistry::with_defaults();
        let Resolution::Resolved { version_coerced, .. } = registry.resolve("kpi_card", 99)
        else {
            panic!("expected best-effort resolution");
        };
        assert!(version_coerced);
    }

    #[test]
    fn unknown_name_resolves_to_placeholder() {
        let registry = ComponentRegistry::with_defaults();
        let resolution = registry.resolve("hologram", 1);
        assert!(resolution.is_placeholder());
    }

    #[test]
    fn hot_swap_returns_previous_entry() {
        let registry = ComponentRegistry::with_defaults();

        let swapped = registry.hot_swap(
            RegistryEntry::new("kpi_card", Arc::new(PlaceholderRenderer))
                .with_versions(vec![1, 2]),
        );
        assert!(swapped.is_some());

        let Resolution::Resolved { entry, .. } = registry.resolve("kpi_card", 2) else {
            panic!("expected resolution");
        };
        assert!(entry.supports_version(2));
    }

    #[test]
    fn reset_restores_base_set() {
        let registry = ComponentRegistry::with_defaults();
        registry.register(RegistryEntry::new("custom_widget", Arc::new(PlaceholderRenderer)));
        registry.remove("kpi_card");

        registry.reset();
        assert!(registry.contains("kpi_card"));
        assert!(!registry.contains("custom_widget"));
        assert_eq!(registry.len(), ALLOWED_COMPONENTS.len());
    }

    #[test]
    fn custom_renderer_is_dispatched() {
        struct Fixed;
        impl crate::renderer::ComponentRenderer for Fixed {
            fn render(&self, _ctx: &RenderContext<'_>) -> Result<Value, RenderError> {
                Ok(Value::String("fixed".into()))
            }
        }

        let registry = ComponentRegistry::new();
        registry.register(RegistryEntry::new("data_table", Arc::new(Fixed)));

        let Resolution::Resolved { entry, .. } = registry.resolve("data_table", 1) else {
            panic!("expected resolution");
        };
        let props = serde_json::Map::new();
        let out = entry
            .renderer
            .render(&RenderContext {
                component_id: "t1",
                component: "data_table",
                version: 1,
                props: &props,
                data: None,
            })
            .unwrap();
        assert_eq!(out, Value::String("fixed".into()));
    }
}
