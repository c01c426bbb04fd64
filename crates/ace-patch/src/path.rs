//! Slash-delimited patch paths
//!
//! Segments address array indices or object keys; which one applies is
//! decided by the container actually found during traversal, so a numeric
//! segment still works as an object key when the target is an object.

use std::fmt;

/// A parsed slash-delimited path, e.g. `/children/1/props/title`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchPath {
    segments: Vec<String>,
}

impl PatchPath {
    /// Parse a path. Leading/trailing/doubled slashes are tolerated;
    /// an empty path (or `/`) addresses the tree root.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self {
            segments: raw
                .split('/')
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Whether this path addresses the tree root
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path segments in traversal order
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// All segments except the terminal one, plus the terminal.
    /// `None` for the root path.
    #[must_use]
    pub fn split_terminal(&self) -> Option<(&[String], &str)> {
        let (last, parents) = self.segments.split_last()?;
        Some((parents, last))
    }

    /// Interpret a segment as an array index
    #[inline]
    #[must_use]
    pub fn as_index(segment: &str) -> Option<usize> {
        segment.parse().ok()
    }
}

impl fmt::Display for PatchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}
