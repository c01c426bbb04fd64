//! The renderer seam
//!
//! The visual component library is an external collaborator; it plugs in
//! by implementing [`ComponentRenderer`]. Renderers produce an abstract
//! render description (`serde_json::Value`); styling and theming live
//! outside the core.

use serde_json::{json, Map, Value};

/// Everything a renderer sees about one leaf
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub component_id: &'a str,
    pub component: &'a str,
    pub version: u32,
    pub props: &'a Map<String, Value>,
    pub data: Option<&'a Value>,
}

/// A renderer's own failure; isolated per leaf by the render walk
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("render failed: {0}")]
pub struct RenderError(pub String);

/// A renderable implementation for one component name
pub trait ComponentRenderer: Send + Sync {
    /// Produce the render description for one leaf.
    ///
    /// # Errors
    /// Failures (and panics) are isolated per leaf by the render walk;
    /// siblings are unaffected.
    fn render(&self, ctx: &RenderContext<'_>) -> Result<Value, RenderError>;
}

/// Base renderer backing the built-in catalog entries.
///
/// Emits the leaf as a render description and leaves the actual visuals to
/// the component library consuming it.
#[derive(Debug, Clone)]
pub struct StandardRenderer {
    component: String,
}

impl StandardRenderer {
    #[inline]
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }
}

impl ComponentRenderer for StandardRenderer {
    fn render(&self, ctx: &RenderContext<'_>) -> Result<Value, RenderError> {
        Ok(json!({
            "component": self.component,
            "componentId": ctx.component_id,
            "version": ctx.version,
            "props": Value::Object(ctx.props.clone()),
            "data": ctx.data.cloned().unwrap_or(Value::Null),
        }))
    }
}

/// Stand-in for names the registry does not know
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderRenderer;

impl ComponentRenderer for PlaceholderRenderer {
    fn render(&self, ctx: &RenderContext<'_>) -> Result<Value, RenderError> {
        Ok(json!({
            "component": "placeholder",
            "componentId": ctx.component_id,
            "requested": ctx.component,
        }))
    }
}
