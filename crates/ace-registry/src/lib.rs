//! ACE Registry - name→implementation dispatch behind the allow-list
//!
//! The registry is the mechanism that keeps dynamic component dispatch a
//! closed vocabulary: an explicit mapping, not reflection. Unknown names
//! resolve to a placeholder rather than erroring: the renderer must never
//! hard-fail because one leaf is unknown.
//!
//! The registry is an explicitly constructed, injected instance per
//! canvas/session; `reset` exists for test isolation, not as a global.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod registry;
pub mod render;
pub mod renderer;

pub use registry::{ComponentRegistry, RegistryEntry, Resolution};
pub use render::{render_tree, RenderOutput, RenderWarning, RenderedLeaf, RenderedNode, RenderedTree};
pub use renderer::{ComponentRenderer, PlaceholderRenderer, RenderContext, RenderError, StandardRenderer};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
