//! History stays bounded and consistent under arbitrary mutation/undo/redo
//! interleavings.

use ace_canvas::{CanvasError, CanvasStore};
use ace_schema::{Delta, PatchOp};
use proptest::prelude::*;
use serde_json::json;

#[derive(Debug, Clone)]
enum Action {
    Patch(u64),
    Undo,
    Redo,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => any::<u64>().prop_map(Action::Patch),
        1 => Just(Action::Undo),
        1 => Just(Action::Redo),
    ]
}

fn seed_layout() -> serde_json::Value {
    json!({
        "type": "Panel",
        "children": [
            { "type": "Component", "componentId": "kpi_1",
              "component": "kpi_card", "props": { "value": 0 } },
        ],
    })
}

proptest! {
    #[test]
    fn history_len_never_exceeds_capacity(
        capacity in 1usize..8,
        actions in prop::collection::vec(action(), 0..64),
    ) {
        let mut store = CanvasStore::with_capacity("cv_prop", capacity);
        store.set_canvas(&seed_layout(), None).unwrap();
        let mut last_version = store.version();

        for action in actions {
            match action {
                Action::Patch(value) => {
                    let delta = Delta::new(vec![PatchOp::UpdateProps {
                        component_id: "kpi_1".into(),
                        props: json!({ "value": value }).as_object().unwrap().clone(),
                    }]);
                    let commit = store.patch_canvas(&delta).unwrap();
                    // Versions only ever grow
                    prop_assert!(commit.version > last_version);
                    last_version = commit.version;
                    // A fresh commit never leaves a redo tail
                    prop_assert!(!store.can_redo());
                }
                Action::Undo => match store.undo() {
                    Ok(_) => prop_assert!(store.can_redo()),
                    Err(CanvasError::NothingToUndo) => prop_assert!(!store.can_undo()),
                    Err(other) => return Err(TestCaseError::fail(other.to_string())),
                },
                Action::Redo => match store.redo() {
                    Ok(_) => prop_assert!(store.can_undo() || store.history_len() == 1),
                    Err(CanvasError::NothingToRedo) => prop_assert!(!store.can_redo()),
                    Err(other) => return Err(TestCaseError::fail(other.to_string())),
                },
            }

            prop_assert!(store.history_len() <= capacity);
            prop_assert!(store.tree().is_some());
        }
    }
}
