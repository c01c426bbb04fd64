//! The component catalog: the closed vocabulary of renderable leaf names
//!
//! Dynamic dispatch from name to implementation happens in the registry
//! crate; this list is the gate in front of it. A name outside this set is
//! rejected by the validator, never silently rendered.

/// Every leaf component name an agent may emit.
///
/// Charts, KPI cards, value-tree cards, tables, narrative blocks, forms.
pub const ALLOWED_COMPONENTS: &[&str] = &[
    "line_chart",
    "bar_chart",
    "pie_chart",
    "area_chart",
    "kpi_card",
    "value_tree_card",
    "data_table",
    "narrative_text",
    "markdown_block",
    "input_form",
];

/// Check a component name against the allow-list
#[inline]
#[must_use]
pub fn is_allowed(name: &str) -> bool {
    ALLOWED_COMPONENTS.contains(&name)
}

/// The allow-list as a comma-joined string, for diagnostics
#[must_use]
pub fn allowed_components() -> String {
    ALLOWED_COMPONENTS.join(", ")
}
