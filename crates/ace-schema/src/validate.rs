//! The validation gate: validator + sanitizer for untrusted layouts
//!
//! Validation never mutates its input and is fail-closed: any error means
//! nothing renders. The sanitizer repairs the recoverable defects the
//! validator downgraded to warnings (missing `componentId`s, mismatched
//! split ratios) and always returns a new tree; it is pure and idempotent.

use crate::catalog::{allowed_components, is_allowed};
use crate::error::SchemaError;
use crate::tree::LayoutNode;
use crate::wire::now_millis;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Maximum tree nesting depth accepted by the gate.
///
/// An owned tree cannot cycle, but a crafted emission can nest unboundedly;
/// past this depth validation fails instead of recursing further.
pub const MAX_DEPTH: usize = 32;

/// One finding, anchored to a slash-delimited tree path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Tree path of the offending node, `/` for the root
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: if path.is_empty() { "/".into() } else { path.into() },
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Outcome of validating one untrusted layout
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Unrecoverable defects; any entry means the layout is rejected
    pub errors: Vec<ValidationIssue>,
    /// Recoverable defects the sanitizer will repair
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// A layout is valid when no errors were found (warnings are fine)
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors formatted for [`SchemaError::Invalid`]
    #[must_use]
    pub fn error_strings(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    fn error(&mut self, path: &str, message: impl Into<String>) {
        self.errors.push(ValidationIssue::new(path, message));
    }

    fn warning(&mut self, path: &str, message: impl Into<String>) {
        self.warnings.push(ValidationIssue::new(path, message));
    }
}

/// Validate an untrusted layout against the schema and the catalog.
///
/// Depth-first walk; never mutates the input.
#[must_use]
pub fn validate(raw: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut seen_ids = HashSet::new();
    walk(raw, "", 1, &mut seen_ids, &mut report);
    report
}

fn walk(
    node: &Value,
    path: &str,
    depth: usize,
    seen_ids: &mut HashSet<String>,
    report: &mut ValidationReport,
) {
    if depth > MAX_DEPTH {
        report.error(path, format!("nesting depth exceeds {MAX_DEPTH}"));
        return;
    }

    let Some(obj) = node.as_object() else {
        report.error(path, "node is not an object");
        return;
    };

    let Some(node_type) = obj.get("type").and_then(Value::as_str) else {
        report.error(path, "missing `type`");
        return;
    };

    match node_type {
        "Component" => validate_leaf(obj, path, seen_ids, report),
        "VerticalSplit" | "HorizontalSplit" => {
            if let Some(children) = require_children(obj, path, report) {
                let ratio_count = obj
                    .get("ratios")
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len);
                if ratio_count != children.len() {
                    report.warning(
                        path,
                        format!(
                            "{node_type} has {ratio_count} ratios for {} children; sanitizer will even them",
                            children.len()
                        ),
                    );
                }
                walk_children(children, path, depth, seen_ids, report);
            }
        }
        "Grid" => {
            match obj.get("columns").and_then(Value::as_u64) {
                Some(1..=12) => {}
                Some(columns) => {
                    report.error(path, format!("Grid columns {columns} outside [1, 12]"));
                }
                None => report.error(path, "Grid missing integer `columns`"),
            }
            if let Some(children) = require_children(obj, path, report) {
                walk_children(children, path, depth, seen_ids, report);
            }
        }
        "Panel" => {
            if let Some(children) = require_children(obj, path, report) {
                walk_children(children, path, depth, seen_ids, report);
            }
        }
        other => report.error(path, format!("unknown node type `{other}`")),
    }
}

fn validate_leaf(
    obj: &Map<String, Value>,
    path: &str,
    seen_ids: &mut HashSet<String>,
    report: &mut ValidationReport,
) {
    match obj.get("component").and_then(Value::as_str) {
        Some(name) if is_allowed(name) => {}
        Some(name) => report.error(
            path,
            format!(
                "unknown component `{name}`; allowed: {}",
                allowed_components()
            ),
        ),
        None => report.error(path, "leaf missing `component` name"),
    }

    match obj.get("componentId").and_then(Value::as_str) {
        Some(id) => {
            if !seen_ids.insert(id.to_string()) {
                report.error(path, format!("duplicate componentId `{id}`"));
            }
        }
        None => report.warning(path, "missing componentId; sanitizer will synthesize one"),
    }
}

fn require_children<'a>(
    obj: &'a Map<String, Value>,
    path: &str,
    report: &mut ValidationReport,
) -> Option<&'a Vec<Value>> {
    match obj.get("children").and_then(Value::as_array) {
        Some(children) => Some(children),
        None => {
            report.error(path, "container missing `children` array");
            None
        }
    }
}

fn walk_children(
    children: &[Value],
    path: &str,
    depth: usize,
    seen_ids: &mut HashSet<String>,
    report: &mut ValidationReport,
) {
    for (idx, child) in children.iter().enumerate() {
        let child_path = format!("{path}/children/{idx}");
        walk(child, &child_path, depth + 1, seen_ids, report);
    }
}

/// Repair the recoverable defects in a layout, returning a new tree.
///
/// Pure and idempotent: sanitizing an already-sanitized tree is a no-op.
/// Synthesized ids have the shape `auto_<counter>_<timestamp>`; mismatched
/// split ratios are resized to the child count (padded with `1.0`).
/// Unknown keys are preserved.
#[must_use]
pub fn sanitize(raw: &Value) -> Value {
    let mut counter = 0usize;
    let timestamp = now_millis();
    sanitize_node(raw, &mut counter, timestamp)
}

fn sanitize_node(node: &Value, counter: &mut usize, timestamp: i64) -> Value {
    let Some(obj) = node.as_object() else {
        return node.clone();
    };
    let mut out = obj.clone();

    match obj.get("type").and_then(Value::as_str) {
        Some("Component") => {
            if obj.get("componentId").and_then(Value::as_str).is_none() {
                out.insert(
                    "componentId".to_string(),
                    json!(format!("auto_{counter}_{timestamp}")),
                );
                *counter += 1;
            }
        }
        Some("VerticalSplit" | "HorizontalSplit") => {
            sanitize_children(&mut out, counter, timestamp);
            let child_count = out
                .get("children")
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            let mut ratios = out
                .get("ratios")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            if ratios.len() != child_count {
                ratios.resize(child_count, json!(1.0));
                out.insert("ratios".to_string(), Value::Array(ratios));
            }
        }
        Some("Grid" | "Panel") => sanitize_children(&mut out, counter, timestamp),
        _ => {}
    }

    Value::Object(out)
}

fn sanitize_children(out: &mut Map<String, Value>, counter: &mut usize, timestamp: i64) {
    if let Some(Value::Array(children)) = out.get("children") {
        let repaired: Vec<Value> = children
            .iter()
            .map(|child| sanitize_node(child, counter, timestamp))
            .collect();
        out.insert("children".to_string(), Value::Array(repaired));
    }
}

/// The full gate: validate (fail-closed), sanitize, deserialize.
///
/// # Errors
/// [`SchemaError::Invalid`] with the complete error list when validation
/// fails; [`SchemaError::Deserialize`] if the repaired tree still does not
/// fit the typed layout.
pub fn sanitized_tree(raw: &Value) -> Result<LayoutNode, SchemaError> {
    let report = validate(raw);
    if !report.is_valid() {
        return Err(SchemaError::Invalid {
            errors: report.error_strings(),
        });
    }
    for warning in &report.warnings {
        tracing::debug!(path = %warning.path, "sanitizer repairing: {}", warning.message);
    }
    Ok(serde_json::from_value(sanitize(raw))?)
}
