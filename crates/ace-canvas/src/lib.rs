//! ACE Canvas - canvas state, history, streaming, and the event bus
//!
//! One [`CanvasStore`] per canvas: agent emissions mutate it through the
//! validation gate, every commit lands in a bounded undo/redo history,
//! and streamed layouts assemble chunk by chunk before committing.
//! [`CanvasSession`] wires a store to a component registry, a hydration
//! orchestrator, and the [`EventBus`] that carries user interactions back
//! to the agent loop.
//!
//! # Example
//!
//! ```rust
//! use ace_canvas::CanvasStore;
//! use ace_schema::{Delta, PatchOp};
//! use serde_json::json;
//!
//! let mut store = CanvasStore::new("cv_1");
//! store.set_canvas(&json!({
//!     "type": "Panel",
//!     "children": [
//!         { "type": "Component", "componentId": "kpi_1",
//!           "component": "kpi_card", "props": { "value": 1 } },
//!     ],
//! }), None).unwrap();
//!
//! let delta = Delta::new(vec![PatchOp::UpdateProps {
//!     component_id: "kpi_1".into(),
//!     props: json!({ "value": 2 }).as_object().unwrap().clone(),
//! }]);
//! store.patch_canvas(&delta).unwrap();
//!
//! store.undo().unwrap();
//! assert_eq!(store.tree().unwrap().find_component("kpi_1").unwrap().props["value"], 1);
//! store.redo().unwrap();
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod events;
pub mod session;
pub mod store;

pub use error::CanvasError;
pub use events::{EventBus, EventError, Subscription};
pub use session::CanvasSession;
pub use store::{CanvasStore, Commit, HistorySnapshot, DEFAULT_HISTORY_CAPACITY};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
