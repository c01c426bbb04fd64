//! The layout tree: containers plus leaf components
//!
//! `LayoutNode` is the vetted, renderable form of an agent emission. It is
//! produced exclusively by the validation gate and mutated exclusively by
//! the delta-patch engine; this module only exposes read-only traversal.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A node in the layout tree, discriminated by the `type` wire field.
///
/// Containers hold an ordered sequence of children plus layout parameters;
/// the single leaf kind is [`ComponentNode`], addressed across patches by
/// its stable `componentId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LayoutNode {
    /// Children stacked top-to-bottom, sized by `ratios`
    VerticalSplit(SplitNode),
    /// Children side-by-side, sized by `ratios`
    HorizontalSplit(SplitNode),
    /// Fixed-column grid
    Grid(GridNode),
    /// Titled grouping container
    Panel(PanelNode),
    /// Renderable leaf
    Component(ComponentNode),
}

/// Parameters shared by the two split containers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitNode {
    /// Relative share per child; length always equals `children.len()`
    /// after sanitization
    #[serde(default)]
    pub ratios: Vec<f64>,
    /// Gap between children, in layout units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<f64>,
    /// Ordered child nodes
    pub children: Vec<LayoutNode>,
}

/// Grid container parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridNode {
    /// Column count, valid range `[1, 12]`
    pub columns: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<f64>,
    pub children: Vec<LayoutNode>,
}

/// Titled grouping container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub children: Vec<LayoutNode>,
}

/// A renderable leaf component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentNode {
    /// Globally unique within one tree; stable across patches. This is the
    /// address used by `update_props`/`update_data` operations.
    pub component_id: String,
    /// Component name; must be in the catalog allow-list
    pub component: String,
    /// Component contract version the agent targeted
    #[serde(default = "default_version")]
    pub version: u32,
    /// Untyped prop mapping passed to the renderer
    #[serde(default)]
    pub props: Map<String, Value>,
    /// Hydrated or agent-supplied data payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Endpoints whose responses hydrate this leaf's props
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hydrate_with: Vec<HydrationSource>,
    /// Rendered instead of this leaf when hydration terminally fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Fallback>,
}

fn default_version() -> u32 {
    1
}

/// One endpoint a leaf hydrates from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HydrationSource {
    /// Endpoint key; also the hydration cache key
    pub endpoint: String,
    /// Prop key the response is merged under. When absent, object
    /// responses are flattened into props and scalars keyed by endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_key: Option<String>,
}

impl HydrationSource {
    #[inline]
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            merge_key: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_merge_key(mut self, key: impl Into<String>) -> Self {
        self.merge_key = Some(key.into());
        self
    }
}

/// Degraded stand-in for a leaf whose hydration failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fallback {
    /// Fallback component name (catalog rules apply at render time)
    pub component: String,
    #[serde(default)]
    pub props: Map<String, Value>,
}

impl LayoutNode {
    /// Ordered children, or `None` for a leaf
    #[must_use]
    pub fn children(&self) -> Option<&[LayoutNode]> {
        match self {
            Self::VerticalSplit(s) | Self::HorizontalSplit(s) => Some(&s.children),
            Self::Grid(g) => Some(&g.children),
            Self::Panel(p) => Some(&p.children),
            Self::Component(_) => None,
        }
    }

    /// Whether this node is a renderable leaf
    #[inline]
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Component(_))
    }

    /// All leaf components, depth-first in render order
    #[must_use]
    pub fn leaves(&self) -> Vec<&ComponentNode> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a ComponentNode>) {
        match self {
            Self::Component(c) => out.push(c),
            _ => {
                if let Some(children) = self.children() {
                    for child in children {
                        child.collect_leaves(out);
                    }
                }
            }
        }
    }

    /// Find a leaf by its stable `componentId`
    #[must_use]
    pub fn find_component(&self, component_id: &str) -> Option<&ComponentNode> {
        match self {
            Self::Component(c) if c.component_id == component_id => Some(c),
            Self::Component(_) => None,
            _ => self
                .children()?
                .iter()
                .find_map(|child| child.find_component(component_id)),
        }
    }

    /// All leaf `componentId`s, depth-first
    #[must_use]
    pub fn component_ids(&self) -> Vec<&str> {
        self.leaves()
            .into_iter()
            .map(|c| c.component_id.as_str())
            .collect()
    }

    /// Maximum nesting depth; a lone leaf has depth 1
    #[must_use]
    pub fn depth(&self) -> usize {
        match self.children() {
            None => 1,
            Some(children) => {
                1 + children
                    .iter()
                    .map(LayoutNode::depth)
                    .max()
                    .unwrap_or(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(id: &str, name: &str) -> LayoutNode {
        LayoutNode::Component(ComponentNode {
            component_id: id.to_string(),
            component: name.to_string(),
            version: 1,
            props: Map::new(),
            data: None,
            hydrate_with: Vec::new(),
            fallback: None,
        })
    }

    fn sample() -> LayoutNode {
        LayoutNode::VerticalSplit(SplitNode {
            ratios: vec![1.0, 2.0],
            gap: None,
            children: vec![
                leaf("kpi_1", "kpi_card"),
                LayoutNode::Panel(PanelNode {
                    title: Some("Detail".into()),
                    children: vec![leaf("table_1", "data_table")],
                }),
            ],
        })
    }

    #[test]
    fn round_trips_through_wire_shape() {
        let tree = sample();
        let value = serde_json::to_value(&tree).unwrap();

        assert_eq!(value["type"], "VerticalSplit");
        assert_eq!(value["children"][0]["componentId"], "kpi_1");
        assert_eq!(value["children"][1]["children"][0]["component"], "data_table");

        let back: LayoutNode = serde_json::from_value(value).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn component_defaults_apply() {
        let node: LayoutNode = serde_json::from_value(json!({
            "type": "Component",
            "componentId": "c1",
            "component": "kpi_card",
        }))
        .unwrap();

        let LayoutNode::Component(c) = node else {
            panic!("expected leaf");
        };
        assert_eq!(c.version, 1);
        assert!(c.props.is_empty());
        assert!(c.hydrate_with.is_empty());
    }

    #[test]
    fn leaves_in_render_order() {
        let tree = sample();
        let ids: Vec<_> = tree.component_ids();
        assert_eq!(ids, vec!["kpi_1", "table_1"]);
    }

    #[test]
    fn find_component_searches_nested() {
        let tree = sample();
        assert_eq!(tree.find_component("table_1").unwrap().component, "data_table");
        assert!(tree.find_component("missing").is_none());
    }

    #[test]
    fn depth_counts_nesting() {
        assert_eq!(leaf("a", "kpi_card").depth(), 1);
        assert_eq!(sample().depth(), 3);
    }

    #[test]
    fn hydration_source_builder() {
        let source = HydrationSource::new("/api/revenue").with_merge_key("revenue");
        assert_eq!(source.endpoint, "/api/revenue");
        assert_eq!(source.merge_key.as_deref(), Some("revenue"));
    }
}
