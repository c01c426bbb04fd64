//! ACE Schema - Layout tree, wire shapes, and the validation gate
//!
//! The foundation crate for the Agentic Canvas Engine:
//! - The tagged-union layout tree (`LayoutNode`): containers + leaf components
//! - Wire shapes exchanged with agents (`Emission`, `Delta`, `EventEnvelope`)
//! - The fixed component catalog (the allow-list that makes hallucinated
//!   components unrenderable)
//! - The validator/sanitizer gate every agent emission passes through
//!
//! # Example
//!
//! ```rust
//! use ace_schema::{sanitized_tree, validate};
//! use serde_json::json;
//!
//! let raw = json!({
//!     "type": "VerticalSplit",
//!     "ratios": [1],
//!     "children": [
//!         { "type": "Component", "componentId": "kpi_1",
//!           "component": "kpi_card", "props": { "label": "Revenue" } },
//!         { "type": "Component", "component": "data_table" },
//!     ],
//! });
//!
//! let report = validate(&raw);
//! assert!(report.is_valid()); // missing id and short ratios are warnings
//! assert_eq!(report.warnings.len(), 2);
//!
//! let tree = sanitized_tree(&raw).unwrap();
//! assert_eq!(tree.component_ids().len(), 2);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod catalog;
pub mod error;
pub mod tree;
pub mod validate;
pub mod wire;

// Re-exports for convenience
pub use catalog::{allowed_components, is_allowed};
pub use error::SchemaError;
pub use tree::{ComponentNode, Fallback, GridNode, HydrationSource, LayoutNode, PanelNode, SplitNode};
pub use validate::{
    sanitize, sanitized_tree, validate, ValidationIssue, ValidationReport, MAX_DEPTH,
};
pub use wire::{
    now_millis, CanvasEvent, CanvasEventKind, CanvasOperation, Chunk, Delta, Emission,
    EventEnvelope, PatchOp,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
