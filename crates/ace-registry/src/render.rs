//! The render walk: resolve every leaf, isolate every failure
//!
//! Downstream of the validation gate everything is fail-soft: a leaf whose
//! renderer errors or panics becomes a failed leaf in the output, siblings
//! render untouched, and the page never blanks because one leaf broke.

use crate::registry::{ComponentRegistry, Resolution};
use crate::renderer::{ComponentRenderer, PlaceholderRenderer, RenderContext};
use ace_schema::{ComponentNode, LayoutNode};
use serde_json::{json, Value};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// What one leaf produced
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutput {
    /// The renderer's description
    Rendered(Value),
    /// Unknown name; the placeholder stands in
    Placeholder { requested: String, description: Value },
    /// The renderer errored or panicked; isolated to this leaf
    Failed { message: String },
}

/// One resolved-and-rendered leaf
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLeaf {
    pub component_id: String,
    pub component: String,
    /// The requested version was outside the entry's supported set
    pub version_coerced: bool,
    pub output: RenderOutput,
}

/// The rendered mirror of the layout tree
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedNode {
    Container {
        /// Container discriminant (`VerticalSplit`, `Grid`, ...)
        kind: &'static str,
        /// Layout parameters the renderer consumer needs
        params: Value,
        children: Vec<RenderedNode>,
    },
    Leaf(RenderedLeaf),
}

/// Diagnostics surfaced by the walk; warnings, never fatal
#[derive(Debug, Clone, PartialEq)]
pub enum RenderWarning {
    UnknownComponent {
        component_id: String,
        requested: String,
    },
    VersionCoerced {
        component_id: String,
        requested_version: u32,
    },
    MissingRequiredProps {
        component_id: String,
        missing: Vec<String>,
    },
    RenderFailed {
        component_id: String,
        message: String,
    },
}

/// Result of a full render pass
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTree {
    pub root: RenderedNode,
    pub warnings: Vec<RenderWarning>,
    pub leaf_count: usize,
    pub placeholder_count: usize,
    pub failed_count: usize,
}

impl RenderedTree {
    /// Whether any leaf degraded (placeholder or failure)
    #[inline]
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.placeholder_count > 0 || self.failed_count > 0
    }
}

/// Walk a vetted tree, resolving each leaf through the registry.
///
/// Never fails and never panics outward; every per-leaf problem is
/// captured in the output and the warning list.
#[must_use]
pub fn render_tree(tree: &LayoutNode, registry: &ComponentRegistry) -> RenderedTree {
    let mut walker = Walker {
        registry,
        warnings: Vec::new(),
        leaf_count: 0,
        placeholder_count: 0,
        failed_count: 0,
    };
    let root = walker.walk(tree);
    RenderedTree {
        root,
        warnings: walker.warnings,
        leaf_count: walker.leaf_count,
        placeholder_count: walker.placeholder_count,
        failed_count: walker.failed_count,
    }
}

struct Walker<'a> {
    registry: &'a ComponentRegistry,
    warnings: Vec<RenderWarning>,
    leaf_count: usize,
    placeholder_count: usize,
    failed_count: usize,
}

impl Walker<'_> {
    fn walk(&mut self, node: &LayoutNode) -> RenderedNode {
        match node {
            LayoutNode::VerticalSplit(s) => RenderedNode::Container {
                kind: "VerticalSplit",
                params: json!({ "ratios": s.ratios, "gap": s.gap }),
                children: s.children.iter().map(|c| self.walk(c)).collect(),
            },
            LayoutNode::HorizontalSplit(s) => RenderedNode::Container {
                kind: "HorizontalSplit",
                params: json!({ "ratios": s.ratios, "gap": s.gap }),
                children: s.children.iter().map(|c| self.walk(c)).collect(),
            },
            LayoutNode::Grid(g) => RenderedNode::Container {
                kind: "Grid",
                params: json!({ "columns": g.columns, "gap": g.gap }),
                children: g.children.iter().map(|c| self.walk(c)).collect(),
            },
            LayoutNode::Panel(p) => RenderedNode::Container {
                kind: "Panel",
                params: json!({ "title": p.title }),
                children: p.children.iter().map(|c| self.walk(c)).collect(),
            },
            LayoutNode::Component(c) => RenderedNode::Leaf(self.render_leaf(c)),
        }
    }

    fn render_leaf(&mut self, leaf: &ComponentNode) -> RenderedLeaf {
        self.leaf_count += 1;
        let ctx = RenderContext {
            component_id: &leaf.component_id,
            component: &leaf.component,
            version: leaf.version,
            props: &leaf.props,
            data: leaf.data.as_ref(),
        };

        match self.registry.resolve(&leaf.component, leaf.version) {
            Resolution::Resolved {
                entry,
                version_coerced,
            } => {
                if version_coerced {
                    self.warnings.push(RenderWarning::VersionCoerced {
                        component_id: leaf.component_id.clone(),
                        requested_version: leaf.version,
                    });
                }

                let missing: Vec<String> = entry
                    .required_props
                    .iter()
                    .filter(|p| !leaf.props.contains_key(*p))
                    .cloned()
                    .collect();
                if !missing.is_empty() {
                    self.warnings.push(RenderWarning::MissingRequiredProps {
                        component_id: leaf.component_id.clone(),
                        missing,
                    });
                }

                let output = match catch_unwind(AssertUnwindSafe(|| entry.renderer.render(&ctx)))
                {
                    Ok(Ok(value)) => RenderOutput::Rendered(value),
                    Ok(Err(err)) => self.leaf_failure(leaf, err.to_string()),
                    Err(_) => self.leaf_failure(leaf, "renderer panicked".to_string()),
                };

                RenderedLeaf {
                    component_id: leaf.component_id.clone(),
                    component: leaf.component.clone(),
                    version_coerced,
                    output,
                }
            }
            Resolution::Placeholder { requested } => {
                self.placeholder_count += 1;
                self.warnings.push(RenderWarning::UnknownComponent {
                    component_id: leaf.component_id.clone(),
                    requested: requested.clone(),
                });
                let description = PlaceholderRenderer
                    .render(&ctx)
                    .unwrap_or(Value::Null);
                RenderedLeaf {
                    component_id: leaf.component_id.clone(),
                    component: leaf.component.clone(),
                    version_coerced: false,
                    output: RenderOutput::Placeholder {
                        requested,
                        description,
                    },
                }
            }
        }
    }

    fn leaf_failure(&mut self, leaf: &ComponentNode, message: String) -> RenderOutput {
        tracing::warn!(component_id = %leaf.component_id, %message, "leaf render failed");
        self.failed_count += 1;
        self.warnings.push(RenderWarning::RenderFailed {
            component_id: leaf.component_id.clone(),
            message: message.clone(),
        });
        RenderOutput::Failed { message }
    }
}
