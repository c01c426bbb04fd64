//! Delta application: best-effort apply and atomic pre-flight
//!
//! [`apply_delta`] is pure: the input tree is deep-copied before any
//! mutation, and operations apply to the copy in list order. Each
//! operation either fully applies or leaves the copy untouched.

use crate::error::PatchError;
use crate::path::PatchPath;
use ace_schema::{Delta, PatchOp, MAX_DEPTH};
use serde_json::{Map, Value};

/// An operation that failed under best-effort semantics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedOp {
    /// Position in the delta's operation list
    pub index: usize,
    pub error: PatchError,
}

/// What [`apply_delta`] produced
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOutcome {
    /// The patched tree (untyped until the gate re-validates it)
    pub tree: Value,
    /// How many operations applied
    pub applied: usize,
    /// Operations that failed, in order
    pub skipped: Vec<SkippedOp>,
}

impl PatchOutcome {
    /// Whether every operation applied
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Pre-flight result for atomic callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaReport {
    /// Every operation that would fail against the current tree
    pub errors: Vec<SkippedOp>,
}

impl DeltaReport {
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Apply a delta best-effort: failed operations are logged, recorded in
/// the outcome, and skipped; the rest still apply.
#[must_use]
pub fn apply_delta(tree: &Value, delta: &Delta) -> PatchOutcome {
    run(tree, delta, true)
}

/// Dry-run a delta and report every operation that would fail.
///
/// The dry-run applies operations to a scratch copy, so an operation that
/// targets a node an earlier operation creates is correctly accepted.
#[must_use]
pub fn validate_delta(tree: &Value, delta: &Delta) -> DeltaReport {
    DeltaReport {
        errors: run(tree, delta, false).skipped,
    }
}

fn run(tree: &Value, delta: &Delta, log: bool) -> PatchOutcome {
    let mut work = tree.clone();
    let mut applied = 0;
    let mut skipped = Vec::new();

    for (index, op) in delta.operations.iter().enumerate() {
        match apply_op(&mut work, op) {
            Ok(()) => applied += 1,
            Err(error) => {
                if log {
                    tracing::warn!(op_index = index, %error, "skipping delta operation");
                }
                skipped.push(SkippedOp { index, error });
            }
        }
    }

    PatchOutcome {
        tree: work,
        applied,
        skipped,
    }
}

fn apply_op(tree: &mut Value, op: &PatchOp) -> Result<(), PatchError> {
    match op {
        PatchOp::Replace { path, value } => write_at(
            tree,
            &PatchPath::parse(path),
            value.clone(),
            WriteMode::Replace,
        ),
        PatchOp::Add { path, value } => {
            write_at(tree, &PatchPath::parse(path), value.clone(), WriteMode::Add)
        }
        PatchOp::Remove { path } => remove_at(tree, &PatchPath::parse(path)),
        PatchOp::UpdateProps {
            component_id,
            props,
        } => update_component(tree, component_id, |obj| merge_props(obj, props)),
        PatchOp::UpdateData { component_id, data } => update_component(tree, component_id, |obj| {
            obj.insert("data".to_string(), data.clone());
        }),
        PatchOp::Reorder {
            parent_path,
            from_index,
            to_index,
        } => reorder(tree, parent_path, *from_index, *to_index),
    }
}

#[derive(Clone, Copy)]
enum WriteMode {
    Replace,
    Add,
}

fn write_at(
    tree: &mut Value,
    path: &PatchPath,
    value: Value,
    mode: WriteMode,
) -> Result<(), PatchError> {
    let Some((parents, terminal)) = path.split_terminal() else {
        // Root path: replace the whole tree
        *tree = value;
        return Ok(());
    };

    match descend_mut(tree, parents, path, true)? {
        Value::Object(map) => {
            map.insert(terminal.to_string(), value);
            Ok(())
        }
        Value::Array(arr) => {
            let index = PatchPath::as_index(terminal).ok_or_else(|| {
                PatchError::PathUnresolvable {
                    path: path.to_string(),
                    reason: format!("`{terminal}` is not an array index"),
                }
            })?;
            match mode {
                WriteMode::Replace if index < arr.len() => {
                    arr[index] = value;
                    Ok(())
                }
                // Add at index == len appends
                WriteMode::Add if index <= arr.len() => {
                    arr.insert(index, value);
                    Ok(())
                }
                _ => Err(PatchError::IndexOutOfBounds {
                    path: path.to_string(),
                    index,
                    len: arr.len(),
                }),
            }
        }
        _ => Err(PatchError::PathUnresolvable {
            path: path.to_string(),
            reason: "terminal parent is not a container".to_string(),
        }),
    }
}

fn remove_at(tree: &mut Value, path: &PatchPath) -> Result<(), PatchError> {
    let Some((parents, terminal)) = path.split_terminal() else {
        return Err(PatchError::PathUnresolvable {
            path: path.to_string(),
            reason: "cannot remove the tree root".to_string(),
        });
    };

    match descend_mut(tree, parents, path, false)? {
        Value::Object(map) => map.remove(terminal).map(|_| ()).ok_or_else(|| {
            PatchError::PathUnresolvable {
                path: path.to_string(),
                reason: format!("no key `{terminal}` to remove"),
            }
        }),
        Value::Array(arr) => {
            let index = PatchPath::as_index(terminal).ok_or_else(|| {
                PatchError::PathUnresolvable {
                    path: path.to_string(),
                    reason: format!("`{terminal}` is not an array index"),
                }
            })?;
            if index < arr.len() {
                arr.remove(index);
                Ok(())
            } else {
                Err(PatchError::IndexOutOfBounds {
                    path: path.to_string(),
                    index,
                    len: arr.len(),
                })
            }
        }
        _ => Err(PatchError::PathUnresolvable {
            path: path.to_string(),
            reason: "terminal parent is not a container".to_string(),
        }),
    }
}

/// Walk to the node addressed by `segments`. With `create`, missing object
/// keys are created as empty objects (array gaps are never created).
fn descend_mut<'a>(
    tree: &'a mut Value,
    segments: &[String],
    full: &PatchPath,
    create: bool,
) -> Result<&'a mut Value, PatchError> {
    let mut current = tree;
    for segment in segments {
        current = match current {
            Value::Object(map) => {
                if create {
                    map.entry(segment.clone())
                        .or_insert_with(|| Value::Object(Map::new()))
                } else {
                    map.get_mut(segment)
                        .ok_or_else(|| PatchError::PathUnresolvable {
                            path: full.to_string(),
                            reason: format!("no key `{segment}`"),
                        })?
                }
            }
            Value::Array(arr) => {
                let index =
                    PatchPath::as_index(segment).ok_or_else(|| PatchError::PathUnresolvable {
                        path: full.to_string(),
                        reason: format!("`{segment}` is not an array index"),
                    })?;
                let len = arr.len();
                arr.get_mut(index)
                    .ok_or(PatchError::IndexOutOfBounds {
                        path: full.to_string(),
                        index,
                        len,
                    })?
            }
            _ => {
                return Err(PatchError::PathUnresolvable {
                    path: full.to_string(),
                    reason: format!("segment `{segment}` reaches a scalar"),
                })
            }
        };
    }
    Ok(current)
}

/// Id-addressed mutation: recursive search by `componentId` through all
/// containers' `children`, so the address survives reordering.
fn update_component<F>(tree: &mut Value, component_id: &str, mut apply: F) -> Result<(), PatchError>
where
    F: FnMut(&mut Map<String, Value>),
{
    if search(tree, component_id, 1, &mut apply)? {
        Ok(())
    } else {
        Err(PatchError::ComponentNotFound {
            component_id: component_id.to_string(),
        })
    }
}

fn search<F>(
    node: &mut Value,
    component_id: &str,
    depth: usize,
    apply: &mut F,
) -> Result<bool, PatchError>
where
    F: FnMut(&mut Map<String, Value>),
{
    if depth > MAX_DEPTH {
        return Err(PatchError::DepthExceeded { max: MAX_DEPTH });
    }

    let Some(obj) = node.as_object_mut() else {
        return Ok(false);
    };

    if obj.get("componentId").and_then(Value::as_str) == Some(component_id) {
        apply(obj);
        return Ok(true);
    }

    if let Some(Value::Array(children)) = obj.get_mut("children") {
        for child in children {
            if search(child, component_id, depth + 1, apply)? {
                return Ok(true);
            }
        }
    }

    Ok(false)
}

fn merge_props(obj: &mut Map<String, Value>, props: &Map<String, Value>) {
    let target = obj
        .entry("props".to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(map) = target {
        for (key, value) in props {
            map.insert(key.clone(), value.clone());
        }
    }
}

fn reorder(
    tree: &mut Value,
    parent_path: &str,
    from_index: usize,
    to_index: usize,
) -> Result<(), PatchError> {
    let path = PatchPath::parse(parent_path);
    let target = descend_mut(tree, path.segments(), &path, false)?;

    // The parent path may address the container node or its children
    // array directly; both are accepted.
    let children = match target {
        Value::Array(children) => children,
        Value::Object(obj) => match obj.get_mut("children") {
            Some(Value::Array(children)) => children,
            _ => {
                return Err(PatchError::PathUnresolvable {
                    path: path.to_string(),
                    reason: "container has no children array".to_string(),
                })
            }
        },
        _ => {
            return Err(PatchError::PathUnresolvable {
                path: path.to_string(),
                reason: "parent path does not address a container".to_string(),
            })
        }
    };

    let len = children.len();
    if from_index >= len || to_index >= len {
        return Err(PatchError::BadReorder {
            parent_path: parent_path.to_string(),
            from_index,
            to_index,
            len,
        });
    }

    let child = children.remove(from_index);
    children.insert(to_index, child);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn leaf(id: &str) -> Value {
        json!({ "type": "Component", "componentId": id, "component": "kpi_card",
                "props": {} })
    }

    fn two_leaf_panel() -> Value {
        json!({ "type": "Panel", "children": [leaf("a"), leaf("b")] })
    }

    fn delta(ops: Vec<PatchOp>) -> Delta {
        Delta::new(ops)
    }

    #[test]
    fn replace_at_root_swaps_whole_tree() {
        let tree = two_leaf_panel();
        let replacement = leaf("solo");
        let outcome = apply_delta(
            &tree,
            &delta(vec![PatchOp::Replace {
                path: "/".into(),
                value: replacement.clone(),
            }]),
        );
        assert!(outcome.is_clean());
        assert_eq!(outcome.tree, replacement);
    }

    #[test]
    fn replace_path_round_trip() {
        let tree = two_leaf_panel();
        let outcome = apply_delta(
            &tree,
            &delta(vec![PatchOp::Replace {
                path: "/children/1/props/value".into(),
                value: json!(42),
            }]),
        );
        assert!(outcome.is_clean());
        // Reading the same path back yields the written value
        assert_eq!(
            outcome.tree.pointer("/children/1/props/value"),
            Some(&json!(42))
        );
    }

    #[test]
    fn add_at_length_appends() {
        let tree = two_leaf_panel();
        let outcome = apply_delta(
            &tree,
            &delta(vec![PatchOp::Add {
                path: "/children/2".into(),
                value: leaf("c"),
            }]),
        );
        assert!(outcome.is_clean());
        let children = outcome.tree["children"].as_array().unwrap();
        assert_eq!(children.len(), 3);
        assert_eq!(children[2]["componentId"], "c");
    }

    #[test]
    fn add_past_length_is_path_error() {
        let tree = two_leaf_panel();
        let outcome = apply_delta(
            &tree,
            &delta(vec![PatchOp::Add {
                path: "/children/5".into(),
                value: leaf("c"),
            }]),
        );
        assert_eq!(outcome.applied, 0);
        assert!(matches!(
            outcome.skipped[0].error,
            PatchError::IndexOutOfBounds { index: 5, len: 2, .. }
        ));
    }

    #[test]
    fn remove_splices_array() {
        let tree = two_leaf_panel();
        let outcome = apply_delta(
            &tree,
            &delta(vec![PatchOp::Remove {
                path: "/children/0".into(),
            }]),
        );
        assert!(outcome.is_clean());
        let children = outcome.tree["children"].as_array().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0]["componentId"], "b");
    }

    #[test]
    fn remove_object_key() {
        let tree = leaf("a");
        let outcome = apply_delta(
            &tree,
            &delta(vec![PatchOp::Remove {
                path: "/props".into(),
            }]),
        );
        assert!(outcome.is_clean());
        assert!(outcome.tree.get("props").is_none());
    }

    #[test]
    fn update_props_finds_deeply_nested_leaf() {
        // kpi_1 nested three levels deep; siblings must be byte-for-byte unchanged
        let tree = json!({
            "type": "Panel",
            "children": [
                leaf("sibling_top"),
                { "type": "VerticalSplit", "ratios": [1.0, 1.0], "children": [
                    leaf("sibling_mid"),
                    { "type": "Grid", "columns": 2, "children": [
                        { "type": "Component", "componentId": "kpi_1",
                          "component": "kpi_card", "props": { "label": "Rev" } },
                        leaf("sibling_deep"),
                    ]},
                ]},
            ],
        });
        let sibling_before = serde_json::to_string(&tree["children"][0]).unwrap();

        let outcome = apply_delta(
            &tree,
            &delta(vec![PatchOp::UpdateProps {
                component_id: "kpi_1".into(),
                props: json!({ "value": 42 }).as_object().unwrap().clone(),
            }]),
        );
        assert!(outcome.is_clean());

        let target = &outcome.tree["children"][1]["children"][1]["children"][0];
        assert_eq!(target["props"]["value"], 42);
        assert_eq!(target["props"]["label"], "Rev"); // shallow merge keeps others

        let sibling_after = serde_json::to_string(&outcome.tree["children"][0]).unwrap();
        assert_eq!(sibling_before, sibling_after);
        assert_eq!(
            outcome.tree["children"][1]["children"][1]["children"][1],
            leaf("sibling_deep")
        );
    }

    #[test]
    fn update_data_replaces_wholesale() {
        let mut seeded = leaf("a");
        seeded["data"] = json!({ "old": true, "keep": "no" });
        let outcome = apply_delta(
            &seeded,
            &delta(vec![PatchOp::UpdateData {
                component_id: "a".into(),
                data: json!({ "fresh": 1 }),
            }]),
        );
        assert!(outcome.is_clean());
        assert_eq!(outcome.tree["data"], json!({ "fresh": 1 }));
    }

    #[test]
    fn id_addressed_op_missing_id() {
        let outcome = apply_delta(
            &two_leaf_panel(),
            &delta(vec![PatchOp::UpdateData {
                component_id: "ghost".into(),
                data: json!(null),
            }]),
        );
        assert!(matches!(
            outcome.skipped[0].error,
            PatchError::ComponentNotFound { .. }
        ));
    }

    #[test]
    fn reorder_moves_child() {
        // Reorder /children 1 -> 0 on [A, B] yields [B, A]
        let outcome = apply_delta(
            &two_leaf_panel(),
            &delta(vec![PatchOp::Reorder {
                parent_path: "/children".into(),
                from_index: 1,
                to_index: 0,
            }]),
        );
        assert!(outcome.is_clean());
        let children = outcome.tree["children"].as_array().unwrap();
        assert_eq!(children[0]["componentId"], "b");
        assert_eq!(children[1]["componentId"], "a");
    }

    #[test]
    fn reorder_nested_parent_path() {
        let tree = json!({
            "type": "Panel",
            "children": [
                { "type": "Panel", "children": [leaf("x"), leaf("y"), leaf("z")] },
            ],
        });
        let outcome = apply_delta(
            &tree,
            &delta(vec![PatchOp::Reorder {
                parent_path: "/children/0/children".into(),
                from_index: 0,
                to_index: 2,
            }]),
        );
        assert!(outcome.is_clean());
        let inner = outcome.tree["children"][0]["children"].as_array().unwrap();
        let ids: Vec<_> = inner.iter().map(|c| c["componentId"].as_str().unwrap()).collect();
        assert_eq!(ids, ["y", "z", "x"]);
    }

    #[test]
    fn reorder_rejects_bad_indices_and_missing_children() {
        let outcome = apply_delta(
            &two_leaf_panel(),
            &delta(vec![
                PatchOp::Reorder {
                    parent_path: "/children".into(),
                    from_index: 0,
                    to_index: 9,
                },
                PatchOp::Reorder {
                    parent_path: "/missing".into(),
                    from_index: 0,
                    to_index: 0,
                },
            ]),
        );
        assert_eq!(outcome.applied, 0);
        assert!(matches!(outcome.skipped[0].error, PatchError::BadReorder { .. }));
        assert!(matches!(
            outcome.skipped[1].error,
            PatchError::PathUnresolvable { .. }
        ));
    }

    #[test]
    fn best_effort_continues_past_failures() {
        let outcome = apply_delta(
            &two_leaf_panel(),
            &delta(vec![
                PatchOp::Remove { path: "/children/9".into() }, // fails
                PatchOp::UpdateProps {
                    component_id: "a".into(),
                    props: json!({ "survived": true }).as_object().unwrap().clone(),
                },
            ]),
        );
        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.tree["children"][0]["props"]["survived"], true);
    }

    #[test]
    fn validate_delta_accepts_sequential_dependence() {
        // Op 2 targets the node op 1 creates; a static check would reject it
        let report = validate_delta(
            &two_leaf_panel(),
            &delta(vec![
                PatchOp::Add {
                    path: "/children/2".into(),
                    value: leaf("c"),
                },
                PatchOp::UpdateProps {
                    component_id: "c".into(),
                    props: json!({ "v": 1 }).as_object().unwrap().clone(),
                },
            ]),
        );
        assert!(report.is_valid());
    }

    #[test]
    fn validate_delta_reports_every_failure() {
        let report = validate_delta(
            &two_leaf_panel(),
            &delta(vec![
                PatchOp::Remove { path: "/children/9".into() },
                PatchOp::UpdateData { component_id: "ghost".into(), data: json!(1) },
                PatchOp::Remove { path: "/children/0".into() }, // fine
            ]),
        );
        assert!(!report.is_valid());
        let indices: Vec<_> = report.errors.iter().map(|e| e.index).collect();
        assert_eq!(indices, [0, 1]);
    }

    #[test]
    fn id_search_depth_capped() {
        let mut tree = leaf("target");
        for _ in 0..(MAX_DEPTH + 4) {
            tree = json!({ "type": "Panel", "children": [tree] });
        }
        let outcome = apply_delta(
            &tree,
            &delta(vec![PatchOp::UpdateData {
                component_id: "target".into(),
                data: json!(1),
            }]),
        );
        assert!(matches!(
            outcome.skipped[0].error,
            PatchError::DepthExceeded { .. }
        ));
    }

    #[test]
    fn apply_delta_never_mutates_input() {
        let tree = two_leaf_panel();
        let snapshot = serde_json::to_string(&tree).unwrap();
        let _ = apply_delta(
            &tree,
            &delta(vec![PatchOp::Remove { path: "/children/0".into() }]),
        );
        assert_eq!(serde_json::to_string(&tree).unwrap(), snapshot);
    }

    proptest! {
        #[test]
        fn reorder_preserves_child_id_multiset(
            ids in proptest::collection::vec("[a-z]{1,6}", 2..8),
            from in 0usize..8,
            to in 0usize..8,
        ) {
            let children: Vec<Value> = ids.iter().map(|id| leaf(id)).collect();
            let tree = json!({ "type": "Panel", "children": children });

            let outcome = apply_delta(&tree, &delta(vec![PatchOp::Reorder {
                parent_path: "/children".into(),
                from_index: from,
                to_index: to,
            }]));

            let mut before = ids.clone();
            before.sort();
            let mut after: Vec<String> = outcome.tree["children"]
                .as_array()
                .unwrap()
                .iter()
                .map(|c| c["componentId"].as_str().unwrap().to_string())
                .collect();
            after.sort();
            // Whether the op applied or was rejected, the multiset is intact
            prop_assert_eq!(before, after);
        }

        #[test]
        fn replace_then_read_round_trips(value in proptest::arbitrary::any::<i64>()) {
            let outcome = apply_delta(&two_leaf_panel(), &delta(vec![PatchOp::Replace {
                path: "/children/0/props/n".into(),
                value: json!(value),
            }]));
            prop_assert!(outcome.is_clean());
            prop_assert_eq!(
                outcome.tree.pointer("/children/0/props/n"),
                Some(&json!(value))
            );
        }
    }
}
