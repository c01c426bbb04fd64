//! ACE Patch - the tree-addressed delta-patch engine
//!
//! Applies an ordered batch of path- or id-addressed operations to a
//! layout tree without the agent ever re-sending the whole layout.
//!
//! Two failure policies coexist as two distinct entry points, so callers'
//! expectations are explicit at the type level:
//! - [`apply_delta`] is best-effort: each operation's failure is caught,
//!   logged, and recorded; the remaining operations still apply.
//! - [`validate_delta`] is the pre-flight for atomic callers: it dry-runs
//!   the batch and reports every operation that would fail, so the store's
//!   `batch` entry point can reject all-or-nothing.
//!
//! The engine works on raw [`serde_json::Value`] trees: path operations may
//! legitimately reach inside `props`, and the validation gate re-types the
//! result before it is committed.
//!
//! # Example
//!
//! ```rust
//! use ace_patch::apply_delta;
//! use ace_schema::{Delta, PatchOp};
//! use serde_json::json;
//!
//! let tree = json!({
//!     "type": "Panel",
//!     "children": [
//!         { "type": "Component", "componentId": "kpi_1",
//!           "component": "kpi_card", "props": { "value": 1 } },
//!     ],
//! });
//!
//! let delta = Delta::new(vec![PatchOp::UpdateProps {
//!     component_id: "kpi_1".into(),
//!     props: json!({ "value": 42 }).as_object().unwrap().clone(),
//! }]);
//!
//! let outcome = apply_delta(&tree, &delta);
//! assert!(outcome.is_clean());
//! assert_eq!(outcome.tree["children"][0]["props"]["value"], 42);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod engine;
pub mod error;
pub mod path;

pub use engine::{apply_delta, validate_delta, DeltaReport, PatchOutcome, SkippedOp};
pub use error::PatchError;
pub use path::PatchPath;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
