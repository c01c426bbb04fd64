//! Patch-path errors
//!
//! One error per failed operation. Under best-effort semantics these are
//! logged and skipped; under atomic `batch` semantics any one of them
//! rejects the whole delta.

/// Why a single delta operation could not be applied
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    /// A path segment did not resolve against the tree
    #[error("path `{path}` unresolvable: {reason}")]
    PathUnresolvable { path: String, reason: String },

    /// An array index was out of bounds
    #[error("index {index} out of bounds at `{path}` (len {len})")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },

    /// An id-addressed operation found no matching leaf
    #[error("no component with componentId `{component_id}`")]
    ComponentNotFound { component_id: String },

    /// A reorder's indices were invalid for the container
    #[error("cannot reorder `{parent_path}`: move {from_index} -> {to_index} in {len} children")]
    BadReorder {
        parent_path: String,
        from_index: usize,
        to_index: usize,
        len: usize,
    },

    /// The id search exceeded the recursion cap
    #[error("recursion depth exceeds {max} while searching the tree")]
    DepthExceeded { max: usize },
}
